use serde::{Deserialize, Serialize};

/// Envelope carried from the popup to the content script.
///
/// Serialized as `{ "action": "highlight", "selector": "#id" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DispatchMessage {
    Highlight { selector: String },
}

/// Receiver-side view of the envelope. Actions this build does not know about
/// land in `Unrecognized` and are dropped without error.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum InboundMessage {
    Highlight {
        #[serde(default)]
        selector: String,
    },
    #[serde(other)]
    Unrecognized,
}

impl DispatchMessage {
    pub fn highlight(selector: impl Into<String>) -> Self {
        DispatchMessage::Highlight {
            selector: selector.into(),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            DispatchMessage::Highlight { .. } => "highlight",
        }
    }

    /// Decode a wire payload, returning `None` for anything the receiver should ignore.
    pub fn decode(payload: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<InboundMessage>(payload.clone()) {
            Ok(InboundMessage::Highlight { selector }) if !selector.is_empty() => {
                Some(DispatchMessage::Highlight { selector })
            }
            Ok(InboundMessage::Highlight { .. }) => {
                tracing::debug!("highlight message without selector ignored");
                None
            }
            Ok(InboundMessage::Unrecognized) => {
                tracing::debug!(action = %payload["action"], "unrecognized action ignored");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "malformed bus message ignored");
                None
            }
        }
    }
}

/// Optional reply from the content script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub success: bool,
    /// Number of elements the receiver marked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<usize>,
}

impl Acknowledgement {
    pub fn success(matched: usize) -> Self {
        Self {
            success: true,
            matched: Some(matched),
        }
    }

    pub fn failure() -> Self {
        Self {
            success: false,
            matched: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn highlight_wire_shape() {
        let value = serde_json::to_value(DispatchMessage::highlight("#foo")).unwrap();
        assert_eq!(value, json!({ "action": "highlight", "selector": "#foo" }));
    }

    #[test]
    fn decode_accepts_highlight() {
        let msg = DispatchMessage::decode(&json!({ "action": "highlight", "selector": "#go" }));
        assert_eq!(msg, Some(DispatchMessage::highlight("#go")));
    }

    #[test]
    fn decode_ignores_unknown_actions() {
        assert_eq!(DispatchMessage::decode(&json!({ "action": "scroll", "selector": "#go" })), None);
        assert_eq!(DispatchMessage::decode(&json!({ "action": "click" })), None);
    }

    #[test]
    fn decode_ignores_malformed_payloads() {
        assert_eq!(DispatchMessage::decode(&json!({ "selector": "#go" })), None);
        assert_eq!(DispatchMessage::decode(&json!("highlight")), None);
        assert_eq!(DispatchMessage::decode(&json!({ "action": "highlight" })), None);
        assert_eq!(DispatchMessage::decode(&json!({ "action": "highlight", "selector": "" })), None);
    }

    #[test]
    fn bare_success_ack_parses() {
        let ack: Acknowledgement = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(ack.success);
        assert_eq!(ack.matched, None);
        assert_eq!(
            serde_json::to_value(Acknowledgement::success(2)).unwrap(),
            json!({ "success": true, "matched": 2 })
        );
    }
}
