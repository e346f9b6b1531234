//! Dashboard statistics.

use axum::{Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::app::AppContext;
use crate::error::Result;
use crate::http::{ApiResponse, RouteModule};
use crate::stalls::StallStatus;

/// Tenant-wide statistics for the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub tenant_name: String,
    pub total_stalls: u64,
    pub verified_stalls: u64,
    pub active_stalls: u64,
    pub allowed_domains: u64,
}

/// Route module for `/dashboard`.
pub struct DashboardModule;

impl RouteModule for DashboardModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new().route("/dashboard", get(dashboard_stats))
    }
}

async fn dashboard_stats(State(ctx): State<AppContext>) -> Result<ApiResponse<DashboardStats>> {
    let stalls = ctx.stalls()?.list().await?;
    let snapshot = ctx.domains()?.list().await?;

    let stats = DashboardStats {
        tenant_name: snapshot.tenant_name,
        total_stalls: stalls.len() as u64,
        verified_stalls: stalls.iter().filter(|s| s.is_verified).count() as u64,
        active_stalls: stalls
            .iter()
            .filter(|s| s.status == StallStatus::Active)
            .count() as u64,
        allowed_domains: snapshot.domains.len() as u64,
    };

    Ok(ApiResponse::success(stats))
}
