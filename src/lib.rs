//! Stallboard - admin backend for campus food-stall management
//!
//! A single-tenant admin service built on Axum and Tokio: an administrator
//! signs in through an external identity provider, is authorized against the
//! tenant's email-domain allow-list, and manages food stalls and the
//! allow-list itself.
//!
//! # Features
//!
//! - **Auth**: domain-gated login/logout with session rehydration, published
//!   session state, and a route guard for protected views
//! - **Entities**: CRUD for stalls and allowed email domains over
//!   pluggable store traits with in-memory implementations
//! - **Testing**: fluent HTTP testing utilities for the assembled router
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stallboard::{
//!     App, AppContext, ConfigBuilder,
//!     allowlist::{DomainService, DomainsModule, InMemoryAllowListStore},
//!     auth::{AuthModule, InMemoryIdentityProvider, InMemoryTokenStore, SessionManager},
//!     dashboard::DashboardModule,
//!     stalls::{InMemoryStallStore, StallService, StallsModule},
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     stallboard::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build().unwrap();
//!
//!     let provider = Arc::new(InMemoryIdentityProvider::new());
//!     let allow_list = Arc::new(InMemoryAllowListStore::new().with_tenant(
//!         &config.tenant.id,
//!         &config.tenant.name,
//!         config.tenant.initial_domains.clone(),
//!     ));
//!     let session = Arc::new(SessionManager::new(
//!         provider,
//!         allow_list.clone(),
//!         Arc::new(InMemoryTokenStore::new()),
//!         &config.tenant.id,
//!     ));
//!     session.spawn_listener();
//!
//!     let context = AppContext::builder()
//!         .with_session(session)
//!         .with_domains(Arc::new(DomainService::new(allow_list, &config.tenant.id)))
//!         .with_stalls(Arc::new(StallService::new(
//!             Arc::new(InMemoryStallStore::new()),
//!             &config.tenant.id,
//!         )))
//!         .build();
//!
//!     App::with_config(config)
//!         .with_context(context)
//!         .register_module(AuthModule)
//!         .register_protected_module(DashboardModule)
//!         .register_protected_module(StallsModule)
//!         .register_protected_module(DomainsModule)
//!         .serve()
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod allowlist;
mod app;
pub mod auth;
mod config;
mod core;
pub mod dashboard;
mod error;
pub mod health;
mod http;
mod middleware;
pub mod stalls;
pub mod testing;
mod utils;
pub mod validation;

// Re-exports for public API
pub use app::{AppContext, AppContextBuilder};
pub use config::{AuthConfig, Config, ConfigBuilder, LoggingConfig, ServerConfig, TenantConfig};
pub use core::App;
pub use error::{ErrorResponse, Result, StallboardError};
pub use health::{HealthResponse, HealthStatus};
pub use http::{ApiResponse, NoContentResponse, RouteModule};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before creating the App.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "stallboard=debug")
/// - `STALLBOARD_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("STALLBOARD_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
