//! The message shape passed to and from the LLM Adapter.

use serde::{Deserialize, Serialize};

/// A single turn in a conversation sent to an LLM provider.
///
/// This is the wire-level contract the LLM Adapter (C1) exposes to agents:
/// a list of `Message`s in, `role`/`content` pairs, and nothing provider
/// specific leaks through it.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// `"system"`, `"user"`, or `"assistant"`. Use the constants below.
    pub role: String,
    pub content: String,
}

impl Message {
    pub const SYSTEM: &'static str = "system";
    pub const USER: &'static str = "user";
    pub const ASSISTANT: &'static str = "assistant";

    #[must_use]
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Self::USER, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convenience_constructors_set_role() {
        assert_eq!(Message::user("hi").role, Message::USER);
        assert_eq!(Message::assistant("hi").role, Message::ASSISTANT);
        assert_eq!(Message::system("hi").role, Message::SYSTEM);
    }

    #[test]
    fn serde_round_trip() {
        let msg = Message::user("test");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }
}
