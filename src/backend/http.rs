use async_trait::async_trait;

use crate::backend::provider::QueryBackend;
use crate::backend::types::{BackendReply, QueryRequest, QueryResponse};
use crate::config::BackendConfig;
use crate::errors::{PageHintError, PageHintResult};

/// JSON-over-HTTP backend: `POST {api_base}{query_path}` with `{ "input": ... }`.
pub struct HttpQueryBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpQueryBackend {
    pub fn new(api_base: &str, query_path: &str) -> Self {
        let endpoint = format!(
            "{}/{}",
            api_base.trim_end_matches('/'),
            query_path.trim_start_matches('/')
        );
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.api_base, &config.query_path)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryBackend for HttpQueryBackend {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn query(&self, input: &str) -> PageHintResult<BackendReply> {
        tracing::debug!(endpoint = %self.endpoint, input_len = input.len(), "sending query");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&QueryRequest {
                input: input.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PageHintError::Backend(format!("{}: {}", status, body)));
        }

        let body: QueryResponse = response.json().await?;
        tracing::info!(reply_len = body.response.len(), "backend reply received");
        Ok(body.into())
    }
}
