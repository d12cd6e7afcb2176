use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

mod commands;
mod context;
mod logging;
mod render;
mod repl;
mod selection;

use context::AppContext;

#[derive(Parser)]
#[command(name = "tesseract")]
#[command(about = "Tesseract AI - a personal chat companion backed by Gemini", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this directory for config, secrets, logs and chats
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Mirror all log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Send one message to the active chat and print the reply
    Ask {
        /// Start a new chat first
        #[arg(long)]
        new: bool,
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Manage stored chats
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Improve a query so the chatbot can answer it more accurately
    Enhance {
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Suggest three topics to explore next
    Topics {
        /// Chat number or id (defaults to the active chat)
        session: Option<String>,
    },
    /// Summarize a chat
    Summarize {
        /// Chat number or id (defaults to the active chat)
        session: Option<String>,
    },
    /// Regenerate a chat title from its whole history
    Title {
        /// Chat number or id (defaults to the active chat)
        session: Option<String>,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List chats, newest first
    List {
        /// Print the stored JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print a chat's messages
    Show {
        /// Chat number or id (defaults to the active chat)
        session: Option<String>,
    },
    /// Delete one chat
    Delete { session: String },
    /// Delete every chat
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = AppContext::load(cli.home.as_deref())?;
    let log_dir = ctx.paths.logs_dir().ok();
    let _log_guard = logging::init(
        log_dir.as_deref(),
        &ctx.config.debug.log_level,
        cli.verbose,
    );
    tracing::info!(
        "[tesseract] Starting as '{}' with model {}",
        ctx.identity.storage_key(),
        ctx.config.model.name
    );

    let result = run(&ctx, cli.command.unwrap_or(Commands::Chat)).await;
    if let Err(e) = &result {
        tracing::error!("[tesseract] {:#}", e);
    }
    result
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Chat => {
            let controller = ctx.controller(Arc::new(render::print_notification)).await?;
            repl::run(controller).await
        }
        Commands::Ask { new, message } => commands::ask(ctx, &message.join(" "), new).await,
        Commands::Sessions { action } => match action {
            SessionsAction::List { json } => commands::sessions_list(ctx, json).await,
            SessionsAction::Show { session } => {
                commands::sessions_show(ctx, session.as_deref()).await
            }
            SessionsAction::Delete { session } => commands::sessions_delete(ctx, &session).await,
            SessionsAction::Clear { yes } => commands::sessions_clear(ctx, yes).await,
        },
        Commands::Enhance { query } => commands::enhance(ctx, &query.join(" ")).await,
        Commands::Topics { session } => commands::topics(ctx, session.as_deref()).await,
        Commands::Summarize { session } => commands::summarize(ctx, session.as_deref()).await,
        Commands::Title { session } => commands::title(ctx, session.as_deref()).await,
    }
}
