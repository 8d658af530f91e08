//! Synchronous HTTP client for the interaction log API.
//!
//! Talks to the agent backend using `ureq`:
//!
//! - `GET  {base}/api/logs` → `{ "logs": [...] }`
//! - `PUT  {base}/api/logs/{id}/feedback` with `{ "feedback": "up" | "down" }`
//!
//! Non-2xx responses and unparseable bodies are errors. No timeout is set
//! unless `[api] timeout_ms` asks for one.

use std::time::Duration;

use anyhow::{Context, Result};

use super::LogApi;
use crate::config::schema::ApiConfig;
use crate::logs::{Feedback, FeedbackRequest, InteractionLog, LogsResponse};

#[derive(Debug, Clone)]
pub struct HttpLogApi {
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpLogApi {
    /// Build a client from the resolved config.
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        // On Windows, "localhost" may try IPv6 (::1) first, causing delays
        // when the backend only binds to IPv4.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");
        Self { base_url, timeout }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn logs_url(&self) -> String {
        format!("{}/api/logs", self.base_url)
    }

    fn feedback_url(&self, id: &str) -> String {
        format!("{}/api/logs/{}/feedback", self.base_url, urlencoding::encode(id))
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = ureq::request(method, url);
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

impl LogApi for HttpLogApi {
    fn fetch_logs(&self) -> Result<Vec<InteractionLog>> {
        let url = self.logs_url();
        let resp = self
            .request("GET", &url)
            .call()
            .with_context(|| format!("GET {url} failed"))?;

        let body: LogsResponse = resp
            .into_json()
            .context("failed to parse log API response")?;

        Ok(body.logs)
    }

    fn send_feedback(&self, id: &str, feedback: Feedback) -> Result<()> {
        let url = self.feedback_url(id);
        self.request("PUT", &url)
            .send_json(FeedbackRequest { feedback })
            .with_context(|| format!("PUT {url} failed"))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
