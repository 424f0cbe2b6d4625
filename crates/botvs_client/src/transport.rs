//! HTTP transport for platform calls.
//!
//! The RPC client only talks to the network through [`Transport`], which
//! keeps the signing and caching logic testable without sockets.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use common::Error;

/// Status and raw body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a URL-encoded form.
    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<HttpResponse, Error>;

    /// Plain GET.
    async fn get(&self, url: &str) -> Result<HttpResponse, Error>;
}

/// reqwest-backed transport with a mandatory per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .expect("failed to build reqwest client");

        Self { client, timeout }
    }

    async fn finish(&self, sent: reqwest::Result<reqwest::Response>) -> Result<HttpResponse, Error> {
        let resp = sent.map_err(|e| self.map_err(e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.map_err(e))?;
        Ok(HttpResponse { status, body })
    }

    fn map_err(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            warn!("Request timed out after {:?}", self.timeout);
            Error::Transport(format!("timed out after {:?}", self.timeout))
        } else {
            warn!("Request failed: {}", e);
            Error::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<HttpResponse, Error> {
        let sent = self.client.post(url).form(form).send().await;
        self.finish(sent).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, Error> {
        let sent = self.client.get(url).send().await;
        self.finish(sent).await
    }
}
