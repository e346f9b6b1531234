//! Allow-list management endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Deserialize;

use crate::app::AppContext;
use crate::error::Result;
use crate::http::{ApiResponse, RouteModule};

use super::AllowListSnapshot;

#[derive(Debug, Clone, Deserialize)]
pub struct AddDomainRequest {
    pub domain: String,
}

/// Route module for `/domains`.
pub struct DomainsModule;

impl RouteModule for DomainsModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/domains", get(list_domains).post(add_domain))
            .route("/domains/:domain", axum::routing::delete(remove_domain))
    }
}

async fn list_domains(State(ctx): State<AppContext>) -> Result<ApiResponse<AllowListSnapshot>> {
    let snapshot = ctx.domains()?.list().await?;
    Ok(ApiResponse::success(snapshot))
}

async fn add_domain(
    State(ctx): State<AppContext>,
    Json(req): Json<AddDomainRequest>,
) -> Result<ApiResponse<AllowListSnapshot>> {
    let snapshot = ctx.domains()?.add(&req.domain).await?;
    Ok(ApiResponse::success_with_message(
        snapshot,
        "Domain added successfully",
    ))
}

async fn remove_domain(
    State(ctx): State<AppContext>,
    Path(domain): Path<String>,
) -> Result<ApiResponse<AllowListSnapshot>> {
    let snapshot = ctx.domains()?.remove(&domain).await?;
    Ok(ApiResponse::success_with_message(
        snapshot,
        "Domain removed successfully",
    ))
}
