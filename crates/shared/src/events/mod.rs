use serde::{Deserialize, Serialize};

/// One frame of a chat stream. Serialized as a single-line JSON object
/// tagged by `type`, which is also the shape clients deserialize.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Sent once, before any content, when the server created a new
    /// conversation for this turn.
    Checkpoint { checkpoint_id: String },
    Content { content: String },
    End,
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_wire_shape() {
        let event = ChatEvent::Checkpoint {
            checkpoint_id: "1f1e7f2a".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"checkpoint","checkpoint_id":"1f1e7f2a"}"#
        );
    }

    #[test]
    fn content_wire_shape() {
        let event = ChatEvent::Content {
            content: "Hello".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"content","content":"Hello"}"#
        );
    }

    #[test]
    fn end_wire_shape() {
        assert_eq!(
            serde_json::to_string(&ChatEvent::End).unwrap(),
            r#"{"type":"end"}"#
        );
    }

    #[test]
    fn error_wire_shape() {
        let event = ChatEvent::Error {
            message: "model request failed".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"error","message":"model request failed"}"#
        );
    }

    #[test]
    fn content_stays_single_line() {
        let event = ChatEvent::Content {
            content: "line one\nline \"two\"".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains('\n'));

        let back: ChatEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
