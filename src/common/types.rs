use serde::{Deserialize, Serialize};

/// A single private message between two users.
///
/// Append-only: once recorded it is never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub to: String,
    pub from: String,
    pub message: String,
    /// Epoch millis. Optional on the wire; the reconciler stamps the
    /// arrival time when the sender left it out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl ChatMessage {
    /// True when this message was exchanged between `a` and `b`,
    /// in either direction.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// A typing-state signal. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEvent {
    pub to: String,
    pub from: String,
    pub is_typing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}
