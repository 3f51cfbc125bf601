pub mod applier;
pub mod document;
pub mod selector;

pub use applier::{HighlightListener, PageActionApplier};
pub use document::{Element, ElementHandle, PageDocument, StaticDocument};
pub use selector::SelectorList;
