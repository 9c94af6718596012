//! # Chat Data Transfer Objects
//!
//! Input contract for `POST /sendchat`.

use serde::{Deserialize, Serialize};
use lib_utils::validation::validate_not_empty;
use crate::error::{AppError, Result};

/// A chat submission as sent by a client.
///
/// Missing fields deserialize as empty strings, so an absent field and an
/// empty one are rejected the same way by [`ChatForCreate::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatForCreate {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub content: String,
}

impl ChatForCreate {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            content: content.into(),
        }
    }

    /// Check that every required field is non-empty.
    pub fn validate(&self) -> Result<()> {
        validate_not_empty(&self.email, "email")
            .and_then(|_| validate_not_empty(&self.username, "username"))
            .and_then(|_| validate_not_empty(&self.content, "content"))
            .map_err(AppError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let chat: ChatForCreate = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(chat.email, "");
        assert_eq!(chat.content, "");
        assert!(matches!(chat.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_names_the_empty_field() {
        let chat = ChatForCreate::new("a@b.com", "alice", "");
        match chat.validate() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("content")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_chat_is_valid() {
        assert!(ChatForCreate::new("a@b.com", "alice", "hi").validate().is_ok());
    }

    #[test]
    fn test_whitespace_fields_are_valid() {
        assert!(ChatForCreate::new(" ", "\t", " ").validate().is_ok());
    }
}
