//! Message history sources
//!
//! The session reads history through the `MessageStore` trait so tests can
//! swap in canned conversations.

mod chat_db;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use chat_db::{ChatDb, apple_time_to_utc, default_chat_db_path};

use crate::Result;

/// One historical message with the correspondent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message body (`None` for rows Messages stored without text)
    pub text: Option<String>,

    /// When the message was sent or received
    pub timestamp: DateTime<Utc>,

    /// Whether the operator sent it
    pub is_from_me: bool,
}

/// Read-only access to the conversation history
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Fetch up to `limit` most recent text messages with `correspondent`,
    /// oldest first
    async fn fetch(&self, correspondent: &str, limit: u32) -> Result<Vec<Message>>;
}

/// Normalize a correspondent identifier into a Messages handle id
///
/// Bare ten-digit numbers are treated as North American and get a `+1`
/// prefix. E-mail handles and numbers already in E.164 form pass through.
#[must_use]
pub fn normalize_correspondent(id: &str) -> String {
    let id = id.trim();

    if id.starts_with('+') || id.contains('@') {
        return id.to_string();
    }

    let digits: String = id.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("+1{digits}")
    } else if digits.len() == 11 && digits.starts_with('1') {
        format!("+{digits}")
    } else {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_number() {
        assert_eq!(normalize_correspondent("5551234567"), "+15551234567");
        assert_eq!(normalize_correspondent("(555) 123-4567"), "+15551234567");
    }

    #[test]
    fn test_normalize_with_country_code() {
        assert_eq!(normalize_correspondent("15551234567"), "+15551234567");
        assert_eq!(normalize_correspondent("+447700900123"), "+447700900123");
    }

    #[test]
    fn test_normalize_email_passthrough() {
        assert_eq!(
            normalize_correspondent(" friend@example.com "),
            "friend@example.com"
        );
    }
}
