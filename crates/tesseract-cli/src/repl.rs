//! Interactive chat REPL.

use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::render;
use crate::selection::resolve_session;
use tesseract_application::chat_controller::ERROR_REPLY;
use tesseract_application::{ChatController, SendOutcome};
use tesseract_core::user::UserIdentity;

type CommandResult = tesseract_core::error::Result<()>;

const COMMANDS: &[(&str, &str)] = &[
    ("/new", "start a new chat"),
    ("/list", "list chats"),
    ("/switch", "switch chat: /switch <number|id>"),
    ("/delete", "delete a chat: /delete [number|id]"),
    ("/clear", "delete every chat"),
    ("/history", "show the active chat"),
    ("/enhance", "improve a query before sending: /enhance <text>"),
    ("/topics", "suggest topics for the active chat"),
    ("/summarize", "summarize the active chat"),
    ("/title", "retitle the active chat from its history"),
    ("/login", "switch user: /login <uid> [display name]"),
    ("/logout", "continue as guest"),
    ("/help", "show commands"),
    ("/quit", "exit"),
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

enum Flow {
    Continue,
    Quit,
}

/// Runs the REPL until `/quit` or EOF.
pub async fn run(controller: ChatController) -> Result<()> {
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Tesseract AI ===".bright_magenta().bold());
    render::print_system("Type a message to chat, '/help' for commands, or '/quit' to exit.");
    greet(&controller).await;
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let flow = if trimmed.starts_with('/') {
                    handle_command(&controller, trimmed).await
                } else {
                    send(&controller, trimmed).await;
                    Flow::Continue
                };
                if matches!(flow, Flow::Quit) {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                render::print_error(&format!("Error: {:?}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn greet(controller: &ChatController) {
    let identity = controller.identity().await;
    match identity.preferred_name() {
        Some(name) => render::print_system(&format!("Signed in as {}.", name)),
        None if identity.is_guest() => render::print_system("Chatting as guest."),
        None => render::print_system(&format!("Signed in as {}.", identity.uid)),
    }
    if let Some(session) = controller.active_session().await {
        if !session.is_empty() {
            render::print_session(&session);
        }
    }
}

async fn send(controller: &ChatController, text: &str) {
    render::print_system("Tesseract is thinking...");
    match controller.submit(text).await {
        SendOutcome::Replied { reply, .. } => {
            for line in reply.lines() {
                println!("{}", line.bright_blue());
            }
            println!();
        }
        SendOutcome::Failed { .. } => {
            println!("{}", ERROR_REPLY.bright_blue());
        }
        SendOutcome::Busy => render::print_system("Still waiting for the previous reply."),
        SendOutcome::Ignored => {}
    }
}

async fn handle_command(controller: &ChatController, line: &str) -> Flow {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(command, rest)| (command, rest.trim()))
        .unwrap_or((line, ""));

    let result = match command {
        "/quit" | "/exit" => return Flow::Quit,
        "/help" => {
            for (name, help) in COMMANDS {
                println!("  {:<12} {}", name.bright_cyan(), help);
            }
            Ok(())
        }
        "/new" => {
            controller.new_chat().await;
            render::print_system("Started a new chat.");
            Ok(())
        }
        "/list" => {
            let store = controller.store();
            let store = store.read().await;
            render::print_session_list(store.sessions(), store.active_session_id());
            Ok(())
        }
        "/switch" => switch(controller, rest).await,
        "/delete" => delete(controller, rest).await,
        "/clear" => {
            controller.clear_history().await;
            render::print_system("Chat history cleared.");
            Ok(())
        }
        "/history" => {
            if let Some(session) = controller.active_session().await {
                render::print_session(&session);
            }
            Ok(())
        }
        "/enhance" => enhance(controller, rest).await,
        "/topics" => topics(controller).await,
        "/summarize" => summarize(controller).await,
        "/title" => controller.retitle_active().await.map(|title| {
            render::print_system(&format!("Renamed to '{}'.", title));
        }),
        "/login" => {
            login(controller, rest).await;
            Ok(())
        }
        "/logout" => {
            controller.switch_user(UserIdentity::guest()).await;
            render::print_system("Now chatting as guest.");
            Ok(())
        }
        other => {
            render::print_system(&format!("Unknown command {}. Try /help.", other));
            Ok(())
        }
    };

    if let Err(e) = result {
        render::print_error(&e.to_string());
    }
    Flow::Continue
}

async fn switch(controller: &ChatController, reference: &str) -> CommandResult {
    let sessions = controller.sessions().await;
    let Some(session) = resolve_session(&sessions, reference) else {
        render::print_system("Usage: /switch <number|id> (see /list)");
        return Ok(());
    };
    controller.switch_chat(&session.id).await?;
    render::print_session(session);
    Ok(())
}

async fn delete(controller: &ChatController, reference: &str) -> CommandResult {
    let sessions = controller.sessions().await;
    let target = if reference.is_empty() {
        controller.active_session().await
    } else {
        resolve_session(&sessions, reference).cloned()
    };
    let Some(session) = target else {
        render::print_system("Usage: /delete [number|id] (see /list)");
        return Ok(());
    };
    controller.delete_chat(&session.id).await?;
    render::print_system(&format!("Deleted '{}'.", session.title));
    Ok(())
}

async fn enhance(controller: &ChatController, text: &str) -> CommandResult {
    if text.is_empty() {
        render::print_system("Usage: /enhance <text>");
        return Ok(());
    }
    let enhanced = controller.enhance_input(text).await?;
    println!("{}", enhanced.bright_yellow());
    send(controller, &enhanced).await;
    Ok(())
}

async fn topics(controller: &ChatController) -> CommandResult {
    let Some(session) = controller.active_session().await.filter(|s| !s.is_empty()) else {
        render::print_system("Chat about something first.");
        return Ok(());
    };
    let suggestions = controller.flows().suggest_topics(session.messages()).await?;
    for topic in suggestions.topics {
        println!("{}", format!("- {}", topic).bright_yellow());
    }
    Ok(())
}

async fn summarize(controller: &ChatController) -> CommandResult {
    let Some(session) = controller.active_session().await.filter(|s| !s.is_empty()) else {
        render::print_system("Chat about something first.");
        return Ok(());
    };
    let summary = controller
        .flows()
        .summarize_chat_history(session.messages())
        .await?;
    println!("{}", summary.bright_yellow());
    Ok(())
}

async fn login(controller: &ChatController, args: &str) {
    let (uid, name) = args
        .split_once(char::is_whitespace)
        .map(|(uid, name)| (uid, Some(name.trim().to_string())))
        .unwrap_or((args, None));
    if uid.is_empty() {
        render::print_system("Usage: /login <uid> [display name]");
        return;
    }
    let identity = UserIdentity::authenticated(uid, name.filter(|n| !n.is_empty()));
    controller.switch_user(identity).await;
    greet(controller).await;
}
