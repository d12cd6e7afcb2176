//! Colored terminal output.

use colored::Colorize;
use tesseract_application::Notification;
use tesseract_core::session::{ChatSession, Message, MessageRole};

pub fn print_message(message: &Message) {
    match message.role {
        MessageRole::User => println!("{}", format!("> {}", message.content).green()),
        MessageRole::Model => {
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

pub fn print_session(session: &ChatSession) {
    println!("{}", format!("=== {} ===", session.title).bright_magenta().bold());
    if session.is_empty() {
        println!("{}", "(no messages yet)".bright_black());
    }
    for message in session.messages() {
        print_message(message);
        println!();
    }
}

/// One line per session, numbered from 1, active session starred.
pub fn print_session_list(sessions: &[ChatSession], active_id: Option<&str>) {
    for (index, session) in sessions.iter().enumerate() {
        let marker = if Some(session.id.as_str()) == active_id {
            "*"
        } else {
            " "
        };
        let created = session
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M");
        let line = format!(
            "{marker} {:>2}. {:<32} {:>3} msgs  {}  {}",
            index + 1,
            session.title,
            session.len(),
            created,
            session.id
        );
        if marker == "*" {
            println!("{}", line.bright_green());
        } else {
            println!("{}", line);
        }
    }
}

pub fn print_system(text: &str) {
    println!("{}", text.bright_black());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red());
}

/// Renders controller notifications as one-line toasts.
pub fn print_notification(notification: Notification) {
    match notification {
        Notification::Error(text) => eprintln!("{}", format!("✗ {}", text).red().bold()),
        Notification::Warning(text) => eprintln!("{}", format!("! {}", text).yellow()),
    }
}
