use crate::app::AppContext;
use axum::Router;

/// Trait for composable route modules
///
/// Each feature module registers its own routes and is composed into the
/// main application router. Handlers access shared services through
/// `State<AppContext>`.
pub trait RouteModule {
    /// Returns a router with all routes for this module
    ///
    /// The router should NOT have state applied - state will be applied
    /// by the App when merging modules.
    fn routes(&self) -> Router<AppContext>
    where
        Self: Sized;

    /// Optional: specify a path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }
}
