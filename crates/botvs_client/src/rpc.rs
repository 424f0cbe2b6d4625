//! Signed RPC client for the BotVS `api/v1` endpoint.
//!
//! Every call is signed, POSTed as a form and decoded as JSON. The decoded
//! envelope is returned untouched; interpreting `code` / `data.error` is the
//! caller's job.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use common::Error;

use crate::auth::{BotvsAuth, NonceSource};
use crate::cache::{cache_key, RpcCache};
use crate::transport::{HttpTransport, Transport};

/// Per-call caching options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallOptions {
    pub cache: bool,
    pub ttl: Duration,
}

impl CallOptions {
    /// Always go to the network.
    pub fn live() -> Self {
        Self::default()
    }

    /// Serve from cache while younger than `ttl`.
    pub fn cached(ttl: Duration) -> Self {
        Self { cache: true, ttl }
    }

    fn uses_cache(&self) -> bool {
        self.cache && !self.ttl.is_zero()
    }
}

/// Async signed RPC client.
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    auth: BotvsAuth,
    endpoint: String,
    cache: Arc<RpcCache>,
    nonces: Arc<NonceSource>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("auth", &self.auth)
            .field("endpoint", &self.endpoint)
            .field("cached_entries", &self.cache.len())
            .finish()
    }
}

impl RpcClient {
    /// Client with its own cache.
    pub fn new(auth: BotvsAuth, transport: Arc<dyn Transport>, endpoint: &str) -> Self {
        Self::with_cache(auth, transport, endpoint, Arc::new(RpcCache::new()))
    }

    /// Client sharing an existing cache.
    pub fn with_cache(
        auth: BotvsAuth,
        transport: Arc<dyn Transport>,
        endpoint: &str,
        cache: Arc<RpcCache>,
    ) -> Self {
        Self {
            transport,
            auth,
            endpoint: endpoint.to_string(),
            cache,
            nonces: Arc::new(NonceSource::new()),
        }
    }

    /// Client over reqwest with the given request timeout.
    pub fn over_http(auth: BotvsAuth, endpoint: &str, timeout: Duration) -> Self {
        Self::new(auth, Arc::new(HttpTransport::new(timeout)), endpoint)
    }

    pub fn cache(&self) -> &Arc<RpcCache> {
        &self.cache
    }

    /// Invoke `method` with positional `args`.
    ///
    /// With caching enabled, a fresh entry for the same method and args is
    /// returned without network I/O, and concurrent misses for one key share a
    /// single live call. Failures are never cached.
    pub async fn call(
        &self,
        method: &str,
        args: &[Value],
        options: CallOptions,
    ) -> Result<Value, Error> {
        let args_json = serde_json::to_string(args)?;

        if !options.uses_cache() {
            return self.call_live(method, &args_json).await;
        }

        let key = cache_key(&self.auth.access_key, method, &args_json);
        if let Some(value) = self.cache.get_fresh(&key, options.ttl) {
            debug!("Cache hit: {}", method);
            return Ok(value);
        }

        let lock = self.cache.flight_lock(&key);
        let result = {
            let _guard = lock.lock().await;
            self.fill(&key, method, &args_json, options.ttl).await
        };
        self.cache.release_flight(&key, &lock);
        result
    }

    /// Cache fill under the per-key flight lock.
    async fn fill(
        &self,
        key: &str,
        method: &str,
        args_json: &str,
        ttl: Duration,
    ) -> Result<Value, Error> {
        // Another caller may have filled the slot while we waited.
        if let Some(value) = self.cache.get_fresh(key, ttl) {
            debug!("Cache hit after wait: {}", method);
            return Ok(value);
        }

        debug!("Cache miss: {}", method);
        let value = self.call_live(method, args_json).await?;
        self.cache.insert(key.to_string(), value.clone());
        Ok(value)
    }

    async fn call_live(&self, method: &str, args_json: &str) -> Result<Value, Error> {
        let nonce = self.nonces.next();
        let request = self.auth.sign_request(method, args_json, nonce);

        debug!(
            "Calling {} (nonce={}, args={} bytes)",
            request.method(),
            request.nonce(),
            request.args().len()
        );

        let resp = self
            .transport
            .post_form(&self.endpoint, &request.form())
            .await?;

        if !resp.is_success() {
            warn!("{} returned HTTP {}", method, resp.status);
            return Err(Error::Transport(format!(
                "HTTP {} from {}: {}",
                resp.status,
                method,
                truncate(&resp.body, 200)
            )));
        }

        let value: Value = serde_json::from_str(&resp.body)?;
        Ok(value)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
