//! Login and logout endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::app::AppContext;
use crate::error::Result;
use crate::http::{ApiResponse, RouteModule};

use super::error::AuthError;
use super::session::{Session, SessionState};

/// Login request from the admin UI.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session summary returned to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_authorized_admin: bool,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            state: session.state,
            email: session.email,
            is_authorized_admin: session.is_authorized_admin,
        }
    }
}

/// Route module for `/login` and `/logout`.
pub struct AuthModule;

impl RouteModule for AuthModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/login", get(login_entry).post(login))
            .route("/logout", post(logout))
    }
}

/// The login entry point the route guard redirects to.
async fn login_entry() -> ApiResponse<()> {
    ApiResponse::success_with_message((), "Please sign in")
}

async fn login(State(ctx): State<AppContext>, Json(req): Json<LoginRequest>) -> Response {
    let manager = match ctx.session() {
        Ok(manager) => manager,
        Err(err) => return err.into_response(),
    };

    match manager.login(&req.email, &req.password).await {
        Ok(session) => ApiResponse::success(SessionView::from(session)).into_response(),
        // The login view shows exactly one human-readable message per
        // failed attempt; provider codes never reach the client.
        Err(err) => {
            let status = login_failure_status(&err);
            (status, ApiResponse::<()>::error(err.user_message())).into_response()
        }
    }
}

fn login_failure_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AuthError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::AccountNotFound
        | AuthError::InvalidCredential
        | AuthError::DomainNotAllowed
        | AuthError::Unknown => StatusCode::UNAUTHORIZED,
    }
}

async fn logout(State(ctx): State<AppContext>) -> Result<ApiResponse<SessionView>> {
    let manager = ctx.session()?;
    manager.logout().await;
    Ok(ApiResponse::success_with_message(
        SessionView::from(manager.current()),
        "Signed out",
    ))
}
