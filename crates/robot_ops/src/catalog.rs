//! Exchange catalog from the platform's `symbols.json`.
//!
//! Read-through: fetched on first use and kept until a forced refresh.

use std::sync::Arc;

use botvs_client::Transport;
use common::{Error, ExchangeInfo};
use tokio::sync::RwLock;
use tracing::debug;

pub struct ExchangeCatalog {
    transport: Arc<dyn Transport>,
    url: String,
    exchanges: RwLock<Option<Arc<Vec<ExchangeInfo>>>>,
}

impl std::fmt::Debug for ExchangeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeCatalog")
            .field("url", &self.url)
            .finish()
    }
}

impl ExchangeCatalog {
    pub fn new(transport: Arc<dyn Transport>, url: &str) -> Self {
        Self {
            transport,
            url: url.to_string(),
            exchanges: RwLock::new(None),
        }
    }

    /// All known exchanges; `force` refetches even when already loaded.
    pub async fn list(&self, force: bool) -> Result<Arc<Vec<ExchangeInfo>>, Error> {
        if !force {
            if let Some(list) = self.exchanges.read().await.as_ref() {
                return Ok(Arc::clone(list));
            }
        }

        let mut slot = self.exchanges.write().await;
        if !force {
            if let Some(list) = slot.as_ref() {
                return Ok(Arc::clone(list));
            }
        }

        let resp = self.transport.get(&self.url).await?;
        if !resp.is_success() {
            return Err(Error::Transport(format!(
                "HTTP {} fetching exchange catalog",
                resp.status
            )));
        }
        let list: Vec<ExchangeInfo> = serde_json::from_str(&resp.body)?;
        debug!("Initialized {} exchanges", list.len());

        let list = Arc::new(list);
        *slot = Some(Arc::clone(&list));
        Ok(list)
    }

    pub async fn find(&self, eid: &str) -> Result<ExchangeInfo, Error> {
        self.list(false)
            .await?
            .iter()
            .find(|e| e.eid == eid)
            .cloned()
            .ok_or_else(|| Error::ExchangeNotFound(eid.to_string()))
    }

    /// Default trading pair for an exchange: the first of its `stocks`.
    pub async fn default_stock(&self, eid: &str) -> Result<String, Error> {
        let info = self.find(eid).await?;
        info.default_stock()
            .map(str::to_string)
            .ok_or_else(|| Error::ExchangeNotFound(format!("{eid} lists no stocks")))
    }
}
