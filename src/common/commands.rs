use super::types::{ChatMessage, TypingEvent};

/// Commands from the UI down to the network task.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Connect to the relay and register under this display name.
    /// The network task stays idle until it receives this once.
    Register { name: String },
    SendMessage(ChatMessage),
    SetTyping(TypingEvent),
}
