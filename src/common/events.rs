use super::types::{ChatMessage, TypingEvent};

/// Events from the network task up to the UI.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// Websocket connected; `session_id` is the fresh id for this connection.
    Connected { session_id: String },
    /// The relay accepted our registration and sent the current roster.
    Registered { users: Vec<String> },
    MessageReceived(ChatMessage),
    TypingReceived(TypingEvent),
    UserConnected(String),
    UserDisconnected(String),
    ConnectionError(String),
    Disconnected,
}
