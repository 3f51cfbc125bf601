pub mod http;
pub mod provider;
pub mod types;

pub use http::HttpQueryBackend;
pub use provider::QueryBackend;
pub use types::BackendReply;
