use std::sync::Arc;

use crate::allowlist::DomainService;
use crate::auth::SessionManager;
use crate::stalls::StallService;

/// Application context for dependency injection and shared state
///
/// Holds the injected session manager and entity services. Everything is
/// optional at construction time; accessors return an error when a handler
/// reaches for a dependency that was never wired.
#[derive(Clone, Default)]
pub struct AppContext {
    session: Option<Arc<SessionManager>>,
    stalls: Option<Arc<StallService>>,
    domains: Option<Arc<DomainService>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern for constructing AppContext
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }

    /// Get the session manager, returning an error if not configured
    pub fn session(&self) -> crate::error::Result<&Arc<SessionManager>> {
        self.session
            .as_ref()
            .ok_or_else(|| crate::error::StallboardError::internal("Session manager not configured"))
    }

    /// Get the stall service, returning an error if not configured
    pub fn stalls(&self) -> crate::error::Result<&Arc<StallService>> {
        self.stalls
            .as_ref()
            .ok_or_else(|| crate::error::StallboardError::internal("Stall service not configured"))
    }

    /// Get the domain service, returning an error if not configured
    pub fn domains(&self) -> crate::error::Result<&Arc<DomainService>> {
        self.domains
            .as_ref()
            .ok_or_else(|| crate::error::StallboardError::internal("Domain service not configured"))
    }
}

/// Builder for AppContext with fluent API
#[must_use = "builder does nothing until you call build()"]
#[derive(Default)]
pub struct AppContextBuilder {
    session: Option<Arc<SessionManager>>,
    stalls: Option<Arc<StallService>>,
    domains: Option<Arc<DomainService>>,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session manager
    pub fn with_session(mut self, session: Arc<SessionManager>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the stall service
    pub fn with_stalls(mut self, stalls: Arc<StallService>) -> Self {
        self.stalls = Some(stalls);
        self
    }

    /// Set the domain service
    pub fn with_domains(mut self, domains: Arc<DomainService>) -> Self {
        self.domains = Some(domains);
        self
    }

    pub fn build(self) -> AppContext {
        AppContext {
            session: self.session,
            stalls: self.stalls,
            domains: self.domains,
        }
    }
}
