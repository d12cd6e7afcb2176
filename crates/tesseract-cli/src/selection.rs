//! Resolving user-typed session references.

use tesseract_core::session::ChatSession;

/// Finds a session by list number (1-based), exact id, or unique id prefix.
pub fn resolve_session<'a>(
    sessions: &'a [ChatSession],
    reference: &str,
) -> Option<&'a ChatSession> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if let Ok(number) = reference.parse::<usize>() {
        if let Some(session) = number.checked_sub(1).and_then(|i| sessions.get(i)) {
            return Some(session);
        }
    }

    if let Some(exact) = sessions.iter().find(|s| s.id == reference) {
        return Some(exact);
    }

    let mut matches = sessions.iter().filter(|s| s.id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}
