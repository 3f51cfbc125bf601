pub mod controller;
pub mod message;
pub mod state;

pub use controller::{ChatSessionController, FALLBACK_REPLY};
pub use message::{ChatMessage, ChatRole};
pub use state::{SessionState, SubmitOutcome};
