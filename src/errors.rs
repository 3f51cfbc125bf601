use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageHintError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Page error: {0}")]
    Page(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl PageHintError {
    pub fn selector(selector: &str, reason: impl Into<String>) -> Self {
        PageHintError::Selector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

pub type PageHintResult<T> = Result<T, PageHintError>;
