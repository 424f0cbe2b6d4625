//! Access to registered exchange credentials.

use std::collections::HashMap;
use std::sync::RwLock;

use common::{Error, ExchangeCredential};

/// Storage of per-user exchange credentials.
pub trait CredentialStore: Send + Sync {
    fn list_for_user(&self, user_id: i64) -> Vec<ExchangeCredential>;

    fn get(&self, user_id: i64, id: i64) -> Result<ExchangeCredential, Error>;
}

/// Process-local credential store, seeded from configuration.
#[derive(Debug, Default)]
pub struct InMemoryCredentials {
    by_user: RwLock<HashMap<i64, Vec<ExchangeCredential>>>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(user_id: i64, credentials: Vec<ExchangeCredential>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.by_user.write() {
            map.insert(user_id, credentials);
        }
        store
    }
}

fn poisoned() -> Error {
    Error::Other("credential store lock poisoned".into())
}

impl CredentialStore for InMemoryCredentials {
    fn list_for_user(&self, user_id: i64) -> Vec<ExchangeCredential> {
        self.by_user
            .read()
            .map(|map| map.get(&user_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn get(&self, user_id: i64, id: i64) -> Result<ExchangeCredential, Error> {
        let map = self.by_user.read().map_err(|_| poisoned())?;
        map.get(&user_id)
            .and_then(|list| list.iter().find(|c| c.id == id))
            .cloned()
            .ok_or(Error::CredentialNotFound(id))
    }
}
