pub mod extension;
pub mod message;

pub use extension::{ContentScriptPort, Delivery, ExtensionBus, MessageHandler, MessageSender};
pub use message::{Acknowledgement, DispatchMessage};
