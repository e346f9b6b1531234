//! In-memory allow-list store.

use super::{AllowListSnapshot, AllowListStore};
use crate::error::{Result, StallboardError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

struct TenantRecord {
    name: String,
    domains: Vec<String>,
}

/// In-memory backing store for tenant allow-list documents.
///
/// Suitable for single-process deployments and tests. Mutations keep
/// set semantics: adding an existing domain or removing an absent one is a
/// no-op, matching the document-store array operations the hosted backend
/// uses.
#[derive(Default)]
pub struct InMemoryAllowListStore {
    tenants: RwLock<HashMap<String, TenantRecord>>,
}

impl InMemoryAllowListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tenant document.
    #[must_use]
    pub fn with_tenant(
        self,
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        domains: Vec<String>,
    ) -> Self {
        self.tenants.write().unwrap().insert(
            tenant_id.into(),
            TenantRecord {
                name: name.into(),
                domains: domains.into_iter().map(|d| d.to_lowercase()).collect(),
            },
        );
        self
    }
}

#[async_trait]
impl AllowListStore for InMemoryAllowListStore {
    async fn fetch(&self, tenant_id: &str) -> Result<AllowListSnapshot> {
        let tenants = self.tenants.read().unwrap();
        let record = tenants
            .get(tenant_id)
            .ok_or_else(|| StallboardError::not_found(format!("Tenant {} not found", tenant_id)))?;
        Ok(AllowListSnapshot {
            tenant_name: record.name.clone(),
            domains: record.domains.clone(),
        })
    }

    async fn add_domain(&self, tenant_id: &str, domain: &str) -> Result<()> {
        let mut tenants = self.tenants.write().unwrap();
        let record = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| StallboardError::not_found(format!("Tenant {} not found", tenant_id)))?;
        let domain = domain.to_lowercase();
        if !record.domains.contains(&domain) {
            record.domains.push(domain);
        }
        Ok(())
    }

    async fn remove_domain(&self, tenant_id: &str, domain: &str) -> Result<()> {
        let mut tenants = self.tenants.write().unwrap();
        let record = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| StallboardError::not_found(format!("Tenant {} not found", tenant_id)))?;
        let domain = domain.to_lowercase();
        record.domains.retain(|d| d != &domain);
        Ok(())
    }
}
