//! Async HTTP client wrapping reqwest.
//!
//! Used for exactly two things: downloading candidate answer files and
//! POSTing submissions. Non-2xx statuses are returned as values — callers
//! inspect the code. One attempt per call; nothing here retries.

use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

/// HTTP client for file downloads and answer submissions.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new client with a standard Chrome user-agent.
    pub fn new() -> Self {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                  AppleWebKit/537.36 (KHTML, like Gecko) \
                  Chrome/131.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(ua)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// GET a URL, returning `(status, body bytes)`.
    ///
    /// Transport failures are `Err`, including failures while reading the
    /// body; HTTP error statuses are not.
    pub async fn get_bytes(&self, url: &str, timeout: Duration) -> Result<(u16, Vec<u8>)> {
        let resp = self.client.get(url).timeout(timeout).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok((status, body))
    }

    /// POST a JSON body, returning `(status, body text)`.
    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<(u16, String)> {
        let resp = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        Ok((status, text))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
