//! Stall management endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};

use crate::app::AppContext;
use crate::auth::AdminUser;
use crate::error::Result;
use crate::http::{ApiResponse, NoContentResponse, RouteModule};

use super::{NewStall, Stall, StallUpdate};

/// Route module for `/stalls`.
pub struct StallsModule;

impl RouteModule for StallsModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/stalls", get(list_stalls).post(create_stall))
            .route("/stalls/:id", put(update_stall).delete(delete_stall))
            .route("/stalls/:id/verify", post(toggle_verified))
    }
}

async fn list_stalls(State(ctx): State<AppContext>) -> Result<ApiResponse<Vec<Stall>>> {
    let stalls = ctx.stalls()?.list().await?;
    Ok(ApiResponse::success(stalls))
}

async fn create_stall(
    State(ctx): State<AppContext>,
    admin: AdminUser,
    Json(input): Json<NewStall>,
) -> Result<ApiResponse<Stall>> {
    let stall = ctx.stalls()?.create(input, &admin.email).await?;
    Ok(ApiResponse::success_with_message(stall, "Stall created"))
}

async fn update_stall(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(changes): Json<StallUpdate>,
) -> Result<ApiResponse<Stall>> {
    let stall = ctx.stalls()?.update(&id, changes).await?;
    Ok(ApiResponse::success(stall))
}

async fn delete_stall(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<NoContentResponse> {
    ctx.stalls()?.delete(&id).await?;
    Ok(ApiResponse::<()>::no_content())
}

async fn toggle_verified(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Stall>> {
    let stall = ctx.stalls()?.toggle_verified(&id).await?;
    Ok(ApiResponse::success(stall))
}
