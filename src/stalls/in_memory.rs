//! In-memory stall store.

use super::{Stall, StallStore};
use crate::error::{Result, StallboardError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory backing store for the stalls collection, keyed by tenant.
#[derive(Default)]
pub struct InMemoryStallStore {
    stalls: RwLock<HashMap<String, Vec<Stall>>>,
}

impl InMemoryStallStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StallStore for InMemoryStallStore {
    async fn list(&self, tenant_id: &str) -> Result<Vec<Stall>> {
        let stalls = self.stalls.read().unwrap();
        let mut result = stalls.get(tenant_id).cloned().unwrap_or_default();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn insert(&self, tenant_id: &str, stall: &Stall) -> Result<()> {
        let mut stalls = self.stalls.write().unwrap();
        stalls
            .entry(tenant_id.to_string())
            .or_default()
            .push(stall.clone());
        Ok(())
    }

    async fn get(&self, tenant_id: &str, id: &str) -> Result<Option<Stall>> {
        let stalls = self.stalls.read().unwrap();
        Ok(stalls
            .get(tenant_id)
            .and_then(|list| list.iter().find(|s| s.id == id))
            .cloned())
    }

    async fn update(&self, tenant_id: &str, stall: &Stall) -> Result<()> {
        let mut stalls = self.stalls.write().unwrap();
        let list = stalls
            .get_mut(tenant_id)
            .ok_or_else(|| StallboardError::not_found(format!("Stall {} not found", stall.id)))?;
        let existing = list
            .iter_mut()
            .find(|s| s.id == stall.id)
            .ok_or_else(|| StallboardError::not_found(format!("Stall {} not found", stall.id)))?;
        *existing = stall.clone();
        Ok(())
    }

    async fn delete(&self, tenant_id: &str, id: &str) -> Result<bool> {
        let mut stalls = self.stalls.write().unwrap();
        let Some(list) = stalls.get_mut(tenant_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|s| s.id != id);
        Ok(list.len() < before)
    }
}
