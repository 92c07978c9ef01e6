use serde::{Deserialize, Serialize};

use crate::common::{ChatMessage, TypingEvent};

/// One websocket text frame, shaped `{"event": <name>, "data": <payload>}`.
///
/// The set is closed: anything that does not decode into one of these
/// variants is rejected at the transport boundary and never reaches the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Frame {
    /// Outbound only: announce the local identity for this connection.
    Register { name: String, session: String },
    /// Inbound only: registration accepted, payload is the current roster.
    RegistrationSuccessful(Vec<String>),
    PrivateMessage(ChatMessage),
    TypingEvent(TypingEvent),
    UserConnected(String),
    UserDisconnected(String),
}

pub fn encode(frame: &Frame) -> serde_json::Result<String> {
    serde_json::to_string(frame)
}

pub fn decode(text: &str) -> serde_json::Result<Frame> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_private_message() {
        let text = r#"{"event":"private_message","data":{"to":"alice","from":"bob","message":"hi","ts":100}}"#;
        let frame = decode(text).unwrap();
        assert_eq!(
            frame,
            Frame::PrivateMessage(ChatMessage {
                to: "alice".into(),
                from: "bob".into(),
                message: "hi".into(),
                ts: Some(100),
            })
        );
    }

    #[test]
    fn decodes_message_without_timestamp() {
        let text = r#"{"event":"private_message","data":{"to":"alice","from":"bob","message":"hi"}}"#;
        match decode(text).unwrap() {
            Frame::PrivateMessage(msg) => assert_eq!(msg.ts, None),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_event() {
        let text = r#"{"event":"shout","data":"hello everyone"}"#;
        assert!(decode(text).is_err());
    }

    #[test]
    fn register_uses_canonical_event_name() {
        let frame = Frame::Register {
            name: "alice".into(),
            session: "s-1".into(),
        };
        let json = encode(&frame).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "register");
        assert_eq!(value["data"]["name"], "alice");
    }

    #[test]
    fn typing_event_round_trip() {
        let frame = Frame::TypingEvent(TypingEvent {
            to: "bob".into(),
            from: "alice".into(),
            is_typing: true,
            ts: Some(42),
        });
        let decoded = decode(&encode(&frame).unwrap()).unwrap();
        assert_eq!(decoded, frame);
    }
}
