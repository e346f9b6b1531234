//! Food-stall entity and CRUD service.
//!
//! # Tracing Events
//!
//! - `stalls.created` / `stalls.updated` / `stalls.deleted`
//! - `stalls.verification_toggled`

mod in_memory;
mod routes;

pub use in_memory::InMemoryStallStore;
pub use routes::StallsModule;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Result, StallboardError};

/// Operating status of a stall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StallStatus {
    #[default]
    Active,
    Inactive,
}

/// A food stall registered under the tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stall {
    pub id: String,
    pub name: String,
    /// Contact email of the stall owner.
    pub email: String,
    pub is_verified: bool,
    pub status: StallStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Email of the admin who created the record.
    pub created_by: String,
}

/// Payload for creating a stall.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStall {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Partial update for a stall. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StallUpdate {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    pub status: Option<StallStatus>,
    pub is_verified: Option<bool>,
}

/// Document-store surface for the tenant's stalls collection.
#[async_trait]
pub trait StallStore: Send + Sync {
    /// All stalls, newest first by creation time.
    async fn list(&self, tenant_id: &str) -> Result<Vec<Stall>>;

    /// Insert a new stall document.
    async fn insert(&self, tenant_id: &str, stall: &Stall) -> Result<()>;

    /// Fetch a stall by id.
    async fn get(&self, tenant_id: &str, id: &str) -> Result<Option<Stall>>;

    /// Replace an existing stall document.
    async fn update(&self, tenant_id: &str, stall: &Stall) -> Result<()>;

    /// Delete a stall document. Returns false when the id was absent.
    async fn delete(&self, tenant_id: &str, id: &str) -> Result<bool>;
}

/// Stall operations for the admin panel.
pub struct StallService {
    store: Arc<dyn StallStore>,
    tenant_id: String,
}

impl StallService {
    pub fn new(store: Arc<dyn StallStore>, tenant_id: impl Into<String>) -> Self {
        Self {
            store,
            tenant_id: tenant_id.into(),
        }
    }

    /// All stalls, newest first.
    pub async fn list(&self) -> Result<Vec<Stall>> {
        self.store.list(&self.tenant_id).await
    }

    /// Create a stall. New stalls start unverified and active.
    pub async fn create(&self, input: NewStall, created_by: &str) -> Result<Stall> {
        input.validate()?;

        let now = Utc::now();
        let stall = Stall {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            is_verified: false,
            status: StallStatus::Active,
            created_at: now,
            updated_at: now,
            created_by: created_by.to_string(),
        };

        self.store.insert(&self.tenant_id, &stall).await?;
        tracing::info!(
            target: "stalls.created",
            stall_id = %stall.id,
            created_by = %created_by,
            "Stall created"
        );
        Ok(stall)
    }

    /// Apply a partial update, refreshing `updated_at`.
    pub async fn update(&self, id: &str, changes: StallUpdate) -> Result<Stall> {
        changes.validate()?;

        let mut stall = self.fetch(id).await?;
        if let Some(name) = changes.name {
            stall.name = name.trim().to_string();
        }
        if let Some(email) = changes.email {
            stall.email = email.trim().to_lowercase();
        }
        if let Some(status) = changes.status {
            stall.status = status;
        }
        if let Some(is_verified) = changes.is_verified {
            stall.is_verified = is_verified;
        }
        stall.updated_at = Utc::now();

        self.store.update(&self.tenant_id, &stall).await?;
        tracing::info!(target: "stalls.updated", stall_id = %stall.id, "Stall updated");
        Ok(stall)
    }

    /// Delete a stall.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let removed = self.store.delete(&self.tenant_id, id).await?;
        if !removed {
            return Err(StallboardError::not_found(format!("Stall {} not found", id)));
        }
        tracing::info!(target: "stalls.deleted", stall_id = %id, "Stall deleted");
        Ok(())
    }

    /// Flip the verification flag.
    pub async fn toggle_verified(&self, id: &str) -> Result<Stall> {
        let mut stall = self.fetch(id).await?;
        stall.is_verified = !stall.is_verified;
        stall.updated_at = Utc::now();

        self.store.update(&self.tenant_id, &stall).await?;
        tracing::info!(
            target: "stalls.verification_toggled",
            stall_id = %stall.id,
            is_verified = stall.is_verified,
            "Stall verification toggled"
        );
        Ok(stall)
    }

    async fn fetch(&self, id: &str) -> Result<Stall> {
        self.store
            .get(&self.tenant_id, id)
            .await?
            .ok_or_else(|| StallboardError::not_found(format!("Stall {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> StallService {
        StallService::new(Arc::new(InMemoryStallStore::new()), "campus-1")
    }

    fn new_stall(name: &str) -> NewStall {
        NewStall {
            name: name.to_string(),
            email: format!("{}@food.example", name),
        }
    }

    #[tokio::test]
    async fn test_create_seeds_defaults() {
        let service = service();
        let stall = service
            .create(new_stall("chaat-corner"), "admin@tint.edu.in")
            .await
            .unwrap();

        assert!(!stall.is_verified);
        assert_eq!(stall.status, StallStatus::Active);
        assert_eq!(stall.created_by, "admin@tint.edu.in");
        assert_eq!(stall.created_at, stall.updated_at);
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let service = service();

        let bad_name = NewStall {
            name: String::new(),
            email: "ok@food.example".to_string(),
        };
        assert!(service.create(bad_name, "admin@tint.edu.in").await.is_err());

        let bad_email = NewStall {
            name: "ok".to_string(),
            email: "not-an-email".to_string(),
        };
        assert!(service.create(bad_email, "admin@tint.edu.in").await.is_err());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let service = service();
        for name in ["first", "second", "third"] {
            service
                .create(new_stall(name), "admin@tint.edu.in")
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp() {
        let service = service();
        let stall = service
            .create(new_stall("momo-hut"), "admin@tint.edu.in")
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let updated = service
            .update(
                &stall.id,
                StallUpdate {
                    status: Some(StallStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, StallStatus::Inactive);
        assert_eq!(updated.name, "momo-hut");
        assert!(updated.updated_at > stall.updated_at);
    }

    #[tokio::test]
    async fn test_toggle_verified() {
        let service = service();
        let stall = service
            .create(new_stall("juice-bar"), "admin@tint.edu.in")
            .await
            .unwrap();

        let toggled = service.toggle_verified(&stall.id).await.unwrap();
        assert!(toggled.is_verified);

        let toggled = service.toggle_verified(&stall.id).await.unwrap();
        assert!(!toggled.is_verified);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let service = service();
        let err = service.delete("missing-id").await.unwrap_err();
        assert!(matches!(err, StallboardError::NotFound(_)));
    }
}
