use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Substituted when a 2xx response carries no `answer` field.
pub const NO_ANSWER: &str = "(no answer)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Free-form support chat.
    Support { message: String },
    /// Question scoped to a single catalog product.
    Product { product_id: i64, intent: String },
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status.
    #[error("backend rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    /// No usable response: connection refused, timeout, or an unreadable body.
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

/// Seam between the chat session and the remote answering service, so the
/// session state machine is testable without a network.
pub trait SupportBackend {
    fn answer(&self, query: &Query) -> impl Future<Output = Result<String, BackendError>> + Send;
}

#[derive(Debug, Serialize)]
struct SupportRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ProductRequest<'a> {
    intent: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    answer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

impl SupportBackend for HttpBackend {
    async fn answer(&self, query: &Query) -> Result<String, BackendError> {
        let request = match query {
            Query::Support { message } => self
                .client
                .post(format!("{}/ai/support", self.base_url))
                .json(&SupportRequest { message }),
            Query::Product { product_id, intent } => self
                .client
                .post(format!("{}/ai/product/{product_id}", self.base_url))
                .json(&ProductRequest { intent }),
        };

        let response = request
            .send()
            .await
            .map_err(|err| BackendError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: AnswerBody = response
            .json()
            .await
            .map_err(|err| BackendError::Unreachable(err.to_string()))?;
        debug!(has_answer = body.answer.is_some(), "backend replied");
        Ok(body.answer.unwrap_or_else(|| NO_ANSWER.to_string()))
    }
}
