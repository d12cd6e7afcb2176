//! One-shot subcommands.

use crate::context::AppContext;
use crate::render;
use crate::selection::resolve_session;
use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;
use std::sync::Arc;
use tesseract_application::SendOutcome;
use tesseract_application::chat_controller::ERROR_REPLY;
use tesseract_core::session::{ChatSession, ChatSessionStore};

fn pick<'a>(store: &'a ChatSessionStore, reference: Option<&str>) -> Result<&'a ChatSession> {
    match reference {
        Some(reference) => resolve_session(store.sessions(), reference)
            .ok_or_else(|| anyhow!("No chat matches '{}'", reference)),
        None => store
            .active_session()
            .ok_or_else(|| anyhow!("There is no active chat")),
    }
}

fn non_empty(session: &ChatSession) -> Result<()> {
    if session.is_empty() {
        bail!("Chat '{}' has no messages yet", session.title);
    }
    Ok(())
}

fn ensure_saved(store: &mut ChatSessionStore) -> Result<()> {
    match store.take_persist_error() {
        Some(e) => Err(anyhow!(e)).context("Failed to save chat history"),
        None => Ok(()),
    }
}

/// Sends one message to the active chat (or a new one) and prints the reply.
pub async fn ask(ctx: &AppContext, message: &str, new_chat: bool) -> Result<()> {
    let controller = ctx
        .controller(Arc::new(render::print_notification))
        .await?;
    if new_chat {
        controller.new_chat().await;
    }

    let mut outcome = controller.submit(message).await;
    let title_task = outcome.take_title_task();
    match outcome {
        SendOutcome::Ignored => bail!("Nothing to send"),
        SendOutcome::Busy => bail!("A message is already being sent"),
        SendOutcome::Replied { reply, .. } => {
            for line in reply.lines() {
                println!("{}", line.bright_blue());
            }
            // Let the chat name land before exiting
            if let Some(task) = title_task {
                let _ = task.await;
            }
            Ok(())
        }
        SendOutcome::Failed { error, .. } => {
            println!("{}", ERROR_REPLY.bright_blue());
            if let Some(task) = title_task {
                let _ = task.await;
            }
            Err(anyhow!(error)).context("Failed to get AI response")
        }
    }
}

pub async fn sessions_list(ctx: &AppContext, json: bool) -> Result<()> {
    let store = ctx.open_store().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(store.sessions())?);
    } else {
        render::print_session_list(store.sessions(), store.active_session_id());
    }
    Ok(())
}

pub async fn sessions_show(ctx: &AppContext, reference: Option<&str>) -> Result<()> {
    let store = ctx.open_store().await?;
    render::print_session(pick(&store, reference)?);
    Ok(())
}

pub async fn sessions_delete(ctx: &AppContext, reference: &str) -> Result<()> {
    let mut store = ctx.open_store().await?;
    let session = pick(&store, Some(reference))?;
    let (id, title) = (session.id.clone(), session.title.clone());

    store.delete_session(&id).await?;
    ensure_saved(&mut store)?;
    render::print_system(&format!("Deleted '{}'", title));
    Ok(())
}

pub async fn sessions_clear(ctx: &AppContext, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("This deletes every chat; pass --yes to confirm");
    }
    let mut store = ctx.open_store().await?;
    store.clear_all().await;
    ensure_saved(&mut store)?;
    render::print_system("Chat history cleared");
    Ok(())
}

pub async fn enhance(ctx: &AppContext, query: &str) -> Result<()> {
    let enhanced = ctx.flows().await?.enhance_user_query(query).await?;
    println!("{}", enhanced);
    Ok(())
}

pub async fn topics(ctx: &AppContext, reference: Option<&str>) -> Result<()> {
    let store = ctx.open_store().await?;
    let session = pick(&store, reference)?;
    non_empty(session)?;

    let suggestions = ctx.flows().await?.suggest_topics(session.messages()).await?;
    for topic in suggestions.topics {
        println!("- {}", topic);
    }
    Ok(())
}

pub async fn summarize(ctx: &AppContext, reference: Option<&str>) -> Result<()> {
    let store = ctx.open_store().await?;
    let session = pick(&store, reference)?;
    non_empty(session)?;

    let summary = ctx
        .flows()
        .await?
        .summarize_chat_history(session.messages())
        .await?;
    println!("{}", summary);
    Ok(())
}

/// Regenerates a chat's title from its whole history and saves it.
pub async fn title(ctx: &AppContext, reference: Option<&str>) -> Result<()> {
    let mut store = ctx.open_store().await?;
    let session = pick(&store, reference)?;
    non_empty(session)?;
    let (id, messages) = (session.id.clone(), session.messages().to_vec());

    let title = ctx.flows().await?.smart_chat_title(&messages).await?;
    store.rename_session(&id, &title).await;
    ensure_saved(&mut store)?;
    println!("{}", title);
    Ok(())
}
