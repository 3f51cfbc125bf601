use async_trait::async_trait;

use crate::backend::types::BackendReply;
use crate::errors::PageHintResult;

/// The inference service answering chat questions.
///
/// Each call is stateless: only the current input is sent, never the transcript.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    async fn query(&self, input: &str) -> PageHintResult<BackendReply>;
}
