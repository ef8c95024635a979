pub mod models;
pub mod store;

pub use models::*;
pub use store::{SessionError, SessionStore};

const MAX_SESSION_ID_LEN: usize = 128;

/// Session ids become file names, so only a conservative alphabet is allowed.
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
