use crate::{
    app::AppContext,
    auth::RequireAdmin,
    config::Config,
    http::RouteModule,
    middleware::MakeRequestUuid,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::get,
};
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Main application structure for stallboard
pub struct App {
    router: Router<AppContext>,
    protected: Router<AppContext>,
    config: Config,
    context: AppContext,
}

impl App {
    /// Creates a new App with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new App with the provided configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            router: Router::new(),
            protected: Router::new(),
            config,
            context: AppContext::new(),
        }
    }

    /// Set the application context
    pub fn with_context(mut self, context: AppContext) -> Self {
        self.context = context;
        let health_routes =
            Router::<AppContext>::new().route("/health", get(crate::health::health_handler));
        self.router = self.router.merge(health_routes);
        self
    }

    /// Register a route module reachable without authentication
    pub fn register_module<M: RouteModule>(mut self, module: M) -> Self {
        let module_router = module.routes();
        if let Some(prefix) = module.prefix() {
            self.router = self.router.nest(prefix, module_router);
        } else {
            self.router = self.router.merge(module_router);
        }
        self
    }

    /// Register a route module behind the admin route guard
    pub fn register_protected_module<M: RouteModule>(mut self, module: M) -> Self {
        let module_router = module.routes();
        if let Some(prefix) = module.prefix() {
            self.protected = self.protected.nest(prefix, module_router);
        } else {
            self.protected = self.protected.merge(module_router);
        }
        self
    }

    /// Assemble the final router: guard on protected routes, root redirect,
    /// then the middleware stack.
    fn assemble(self) -> (Router, Config) {
        let guard = axum::middleware::from_fn_with_state(
            self.context.clone(),
            RequireAdmin::middleware,
        );
        let protected = self.protected.route_layer(guard);

        let router = self
            .router
            .merge(protected)
            .route("/", get(|| async { Redirect::to("/dashboard") }))
            .with_state(self.context);

        // Middleware order (from outer to inner): body limit, request ids,
        // HTTP tracing.
        let router = router
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http());

        (router, self.config)
    }

    /// Get the router for testing purposes
    ///
    /// Returns the fully assembled router (guard and middleware applied) so
    /// tests can drive it with the crate's testing helpers.
    pub fn into_test_router(self) -> Router {
        self.assemble().0
    }

    /// Start the application server
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let (router, config) = self.assemble();

        let addr = config
            .server
            .addr()
            .expect("Invalid server address in config");

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Server starting on http://{}", addr);
        tracing::info!("Health check available at http://{}/health", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!("Shutdown complete");
}
