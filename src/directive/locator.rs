use serde::{Deserialize, Serialize};

use crate::bus::message::DispatchMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    ElementSelector,
}

/// "Find the element(s) described by `value` in the active page."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLocator {
    pub kind: LocatorKind,
    pub value: String,
}

impl ActionLocator {
    pub fn element_selector(value: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::ElementSelector,
            value: value.into(),
        }
    }
}

impl From<ActionLocator> for DispatchMessage {
    fn from(locator: ActionLocator) -> Self {
        match locator.kind {
            LocatorKind::ElementSelector => DispatchMessage::Highlight {
                selector: locator.value,
            },
        }
    }
}
