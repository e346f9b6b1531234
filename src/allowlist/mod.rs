//! Tenant email-domain allow-list.
//!
//! The allow-list is a single tenant document holding a display name and the
//! set of email domains permitted to sign in as admin. It is fetched fresh
//! per authorization decision and never cached across decisions.
//!
//! # Tracing Events
//!
//! - `allowlist.domain.added` - domain added to the allow-list
//! - `allowlist.domain.removed` - domain removed from the allow-list

mod in_memory;
mod routes;

pub use in_memory::InMemoryAllowListStore;
pub use routes::DomainsModule;

use crate::error::{Result, StallboardError};
use crate::validation::validate_domain_name;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One fetch of the tenant's allow-list document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListSnapshot {
    /// Display name of the tenant.
    pub tenant_name: String,
    /// Permitted email domains, lowercase.
    pub domains: Vec<String>,
}

/// Document-store surface holding the tenant's allow-list.
#[async_trait]
pub trait AllowListStore: Send + Sync {
    /// Fetch the tenant document.
    async fn fetch(&self, tenant_id: &str) -> Result<AllowListSnapshot>;

    /// Add a domain to the tenant's domain set. Adding an existing entry is
    /// a no-op.
    async fn add_domain(&self, tenant_id: &str, domain: &str) -> Result<()>;

    /// Remove a domain from the tenant's domain set. Removing an absent
    /// entry is a no-op.
    async fn remove_domain(&self, tenant_id: &str, domain: &str) -> Result<()>;
}

/// Allow-list operations with the validation the store itself does not do.
///
/// The store is a dumb document mutation surface; the rules (domain format,
/// duplicates, never letting the list go empty) are enforced here, before
/// any store mutation.
pub struct DomainService {
    store: Arc<dyn AllowListStore>,
    tenant_id: String,
}

impl DomainService {
    pub fn new(store: Arc<dyn AllowListStore>, tenant_id: impl Into<String>) -> Self {
        Self {
            store,
            tenant_id: tenant_id.into(),
        }
    }

    /// Fetch the current snapshot.
    pub async fn list(&self) -> Result<AllowListSnapshot> {
        self.store.fetch(&self.tenant_id).await
    }

    /// Validate and add a domain, returning the updated snapshot.
    pub async fn add(&self, domain: &str) -> Result<AllowListSnapshot> {
        let domain = domain.trim().to_lowercase();

        validate_domain_name(&domain).map_err(|err| {
            StallboardError::bad_request(
                err.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid domain format. Example: tint.edu.in".to_string()),
            )
        })?;

        let snapshot = self.store.fetch(&self.tenant_id).await?;
        if snapshot.domains.iter().any(|d| d == &domain) {
            return Err(StallboardError::bad_request("This domain already exists"));
        }

        self.store.add_domain(&self.tenant_id, &domain).await?;
        tracing::info!(
            target: "allowlist.domain.added",
            domain = %domain,
            "Domain added to allow-list"
        );

        self.store.fetch(&self.tenant_id).await
    }

    /// Validate and remove a domain, returning the updated snapshot.
    ///
    /// The allow-list must never be observed empty: removing the last
    /// remaining domain is rejected before any store mutation.
    pub async fn remove(&self, domain: &str) -> Result<AllowListSnapshot> {
        let domain = domain.trim().to_lowercase();

        let snapshot = self.store.fetch(&self.tenant_id).await?;
        if snapshot.domains.len() <= 1 {
            return Err(StallboardError::bad_request(
                "Cannot remove the last domain. At least one domain must exist",
            ));
        }
        if !snapshot.domains.iter().any(|d| d == &domain) {
            return Err(StallboardError::not_found(format!(
                "Domain {} is not on the allow-list",
                domain
            )));
        }

        self.store.remove_domain(&self.tenant_id, &domain).await?;
        tracing::info!(
            target: "allowlist.domain.removed",
            domain = %domain,
            "Domain removed from allow-list"
        );

        self.store.fetch(&self.tenant_id).await
    }
}
