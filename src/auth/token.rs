//! Persisted access-token seam.
//!
//! One opaque string value lives under a fixed key: written on successful
//! authorization, removed on logout or denial. The trait mirrors the
//! key-value surface the browser build used for local storage.

use crate::error::Result;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use std::collections::HashMap;
use std::sync::RwLock;

/// Fixed key under which the admin access token is persisted.
pub const ADMIN_TOKEN_KEY: &str = "admin_token";

/// Storage for the persisted access token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a value under the given key, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Fetch the value stored under the given key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove the value stored under the given key, if any.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory token store.
///
/// Suitable for single-process deployments and tests; a persistent
/// implementation only needs the three operations above.
#[derive(Default)]
pub struct InMemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().unwrap().remove(key);
        Ok(())
    }
}

/// Generate an opaque token value.
pub fn generate_opaque_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
