use serde::{Deserialize, Serialize};

/// Body of `POST /api/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub input: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

/// Raw text the backend produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub text: String,
}

impl From<QueryResponse> for BackendReply {
    fn from(response: QueryResponse) -> Self {
        Self {
            text: response.response,
        }
    }
}
