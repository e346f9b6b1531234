//! Route guard for protected views.
//!
//! Admission is decided solely from the session manager's published state,
//! re-read on every request:
//! - while the session is still resolving, a neutral 503 with `Retry-After`
//!   is returned - no protected content and no login redirect may flash;
//! - without an authorized admin, the request is redirected to the login
//!   entry point;
//! - otherwise the request proceeds with the admin identity attached.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::app::AppContext;
use crate::error::StallboardError;
use crate::http::ApiResponse;

/// The signed-in administrator, attached to requests that pass the guard.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub email: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = StallboardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminUser>()
            .cloned()
            .ok_or_else(|| StallboardError::unauthorized("Not authenticated"))
    }
}

/// Middleware that admits only an authenticated, domain-authorized admin.
pub struct RequireAdmin;

impl RequireAdmin {
    pub async fn middleware(
        State(ctx): State<AppContext>,
        mut request: Request,
        next: Next,
    ) -> Response {
        let session = match ctx.session() {
            Ok(manager) => manager.current(),
            Err(err) => return err.into_response(),
        };

        if session.is_loading {
            return verifying_response();
        }

        if session.identity.is_none() || !session.is_authorized_admin {
            return Redirect::to("/login").into_response();
        }

        let email = session.email.clone().unwrap_or_default();
        request.extensions_mut().insert(AdminUser { email });
        next.run(request).await
    }
}

/// Neutral waiting response while the session is still resolving.
fn verifying_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, "1")],
        ApiResponse::<()>::error("Verifying access"),
    )
        .into_response()
}
