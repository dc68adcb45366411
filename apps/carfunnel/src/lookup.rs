//! # Lookup Port
//!
//! The network side of a stage lookup. [`Lookup`] is the seam the
//! dispatcher talks to; [`HttpLookup`] is the reqwest implementation
//! against the backend's six `GET` endpoints.

use carfunnel_core::{FilterOption, LookupError, StageDescriptor, decode_options};
use std::future::Future;
use std::time::Duration;

// =============================================================================
// LOOKUP TRAIT
// =============================================================================

/// Fetches one stage's option list.
///
/// `param` is the parent stage's selected value, sent under the stage's
/// `request_param`; `None` for the first stage.
pub trait Lookup: Send + Sync + 'static {
    fn fetch(
        &self,
        stage: &'static StageDescriptor,
        param: Option<String>,
    ) -> impl Future<Output = Result<Vec<FilterOption>, LookupError>> + Send;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

/// HTTP client for the stage lookup endpoints.
#[derive(Clone, Debug)]
pub struct HttpLookup {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLookup {
    /// Create a client for the backend at `base_url` (no trailing slash needed).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request for a stage lookup.
    fn request(
        &self,
        stage: &'static StageDescriptor,
        param: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, stage.endpoint);
        let req = self.http.get(&url);
        match (stage.request_param, param) {
            (Some(name), Some(value)) => req.query(&[(name, value)]),
            _ => req,
        }
    }

    /// Send a request and classify transport errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, LookupError> {
        req.send().await.map_err(classify)
    }

    /// Check the status and decode the body.
    async fn handle_response(
        &self,
        resp: reqwest::Response,
    ) -> Result<Vec<FilterOption>, LookupError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(classify)?;
        decode_options(&body)
    }
}

impl Lookup for HttpLookup {
    async fn fetch(
        &self,
        stage: &'static StageDescriptor,
        param: Option<String>,
    ) -> Result<Vec<FilterOption>, LookupError> {
        let req = self.request(stage, param.as_deref());
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }
}

fn classify(e: reqwest::Error) -> LookupError {
    if e.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Transport(e.to_string())
    }
}
