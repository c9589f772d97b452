//! A deliberately small GraphQL client: one POST per query, no caching.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The server rejected the query outright (HTTP 400).
    #[error("{0}")]
    BadRequest(String),
    #[error("server returned HTTP {0}")]
    Status(u16),
    /// The query ran but the response carries an `errors` list.
    #[error("{0}")]
    Graphql(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid JSON response: {0}")]
    Decode(String),
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

#[derive(Debug, Clone)]
pub struct GraphqlClient {
    endpoint: String,
    client: reqwest::Client,
}

impl GraphqlClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Run `query` and return its `data`.
    pub async fn query(&self, query: &str) -> Result<Value, QueryError> {
        let body = QueryBody {
            query: query.trim(),
        };
        tracing::debug!(endpoint = %self.endpoint, query = body.query, "sending query");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        interpret_response(status, &text)
    }
}

/// Map an HTTP status and body onto a query result.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<Value, QueryError> {
    if status == StatusCode::BAD_REQUEST {
        let reason = status.canonical_reason().unwrap_or("Bad Request");
        return Err(QueryError::BadRequest(reason.to_string()));
    }
    if !status.is_success() {
        return Err(QueryError::Status(status.as_u16()));
    }

    let mut json: Value =
        serde_json::from_str(body).map_err(|e| QueryError::Decode(e.to_string()))?;

    if let Some(errors) = json.get("errors").and_then(Value::as_array) {
        if let Some(first) = errors.first() {
            let message = first
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(QueryError::Graphql(message.to_string()));
        }
    }

    match json.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Ok(json),
    }
}
