pub mod locator;
pub mod parser;

pub use locator::{ActionLocator, LocatorKind};
pub use parser::parse_locator;
