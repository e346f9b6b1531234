//! Session manager: the single authoritative answer to "is there a
//! signed-in, domain-authorized administrator".
//!
//! All session mutation happens here, behind one mutex that is released on
//! every exit path. Provider session-change notifications are consumed by a
//! single task (`run`) so updates apply in event order, and the current
//! session is published through a watch channel for the route guard.
//!
//! # Tracing Events
//!
//! - `auth.login.succeeded` / `auth.login.failed` / `auth.login.denied`
//! - `auth.logout` - sign-out, including swallowed provider failures
//! - `auth.session.appeared` / `auth.session.cleared` - provider events

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use crate::allowlist::AllowListStore;

use super::domain::{is_email_domain_allowed, validate_login_email};
use super::error::AuthError;
use super::identity::{Identity, IdentityProvider, ProviderError, SessionChange};
use super::token::{ADMIN_TOKEN_KEY, TokenStore};
use super::verify::RemoteAdminVerifier;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle states of the session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Process start, before the first provider notification.
    Initializing,
    Unauthenticated,
    /// A login call is in flight.
    Authenticating,
    Authenticated,
    /// Credentials were valid but authorization was denied. Transitions
    /// straight back to `Unauthenticated` after the forced sign-out.
    Denied,
}

/// The in-memory record of current authentication/authorization status.
///
/// Invariant: `is_authorized_admin` is only true while `identity` is present
/// and the email's domain was on the allow-list at the last check.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    /// Opaque provider handle, present only when a provider session exists.
    pub identity: Option<Identity>,
    /// Lowercase-normalized email of the signed-in user.
    pub email: Option<String>,
    pub is_authorized_admin: bool,
    pub is_loading: bool,
    /// User-facing message for the most recent failure.
    pub last_error: Option<String>,
}

impl Session {
    fn initializing() -> Self {
        Self {
            state: SessionState::Initializing,
            identity: None,
            email: None,
            is_authorized_admin: false,
            is_loading: true,
            last_error: None,
        }
    }

    fn unauthenticated(last_error: Option<String>) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            identity: None,
            email: None,
            is_authorized_admin: false,
            is_loading: false,
            last_error,
        }
    }
}

/// Cheap clonable read side of the published session state.
#[derive(Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<Session>,
}

impl SessionHandle {
    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.rx.borrow().clone()
    }

    /// Wait for the next published change. Returns false when the manager
    /// is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Owns the session record and every transition on it.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    allow_list: Arc<dyn AllowListStore>,
    tokens: Arc<dyn TokenStore>,
    verifier: Option<RemoteAdminVerifier>,
    tenant_id: String,
    call_timeout: Duration,
    session: Mutex<Session>,
    publish: watch::Sender<Session>,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        allow_list: Arc<dyn AllowListStore>,
        tokens: Arc<dyn TokenStore>,
        tenant_id: impl Into<String>,
    ) -> Self {
        let initial = Session::initializing();
        let (publish, _rx) = watch::channel(initial.clone());
        Self {
            provider,
            allow_list,
            tokens,
            verifier: None,
            tenant_id: tenant_id.into(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            session: Mutex::new(initial),
            publish,
        }
    }

    /// Timeout applied to provider and allow-list calls. Expiry fails
    /// closed as `ServiceUnavailable`.
    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Enable the server-side admin-verification step after the domain
    /// check. Off in the default configuration.
    #[must_use]
    pub fn with_remote_verifier(mut self, verifier: RemoteAdminVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Read side for guards and views.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            rx: self.publish.subscribe(),
        }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.session.lock().unwrap().clone()
    }

    /// Subscribe to the identity provider and consume its session-change
    /// notifications until the provider drops the channel.
    pub fn spawn_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        let changes = manager.provider.subscribe_session_change();
        tokio::spawn(manager.run(changes))
    }

    /// Single consumer of provider events: updates apply in event order
    /// (last writer wins), never out of it.
    pub async fn run(self: Arc<Self>, mut changes: mpsc::UnboundedReceiver<SessionChange>) {
        while let Some(change) = changes.recv().await {
            self.handle_change(change).await;
        }
        tracing::debug!(target: "auth.session.listener", "Session-change stream closed");
    }

    /// Sign in with email and password.
    ///
    /// Input is validated before the provider is contacted. After credential
    /// verification succeeds, the allow-list snapshot is fetched fresh - not
    /// reused from any earlier fetch - and the email domain must match an
    /// entry exactly. On a mismatch the provider session is invalidated
    /// before this returns; the session never reports an authorized admin
    /// for a disallowed domain, not even transiently.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        validate_login_email(&email)?;
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        self.set_session(|s| {
            s.state = SessionState::Authenticating;
            s.is_loading = true;
            s.last_error = None;
        });

        let verified = match self
            .provider_call(self.provider.verify_credential(&email, password))
            .await
        {
            Ok(verified) => verified,
            Err(err) => return Err(self.fail_login(err)),
        };

        // Fresh snapshot, fetched after credential verification - the check
        // must see allow-list edits made since the user's last login.
        let snapshot = match self
            .store_call(self.allow_list.fetch(&self.tenant_id))
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.force_sign_out(&verified.identity).await;
                return Err(self.fail_login(err));
            }
        };

        if !is_email_domain_allowed(&email, &snapshot.domains) {
            return Err(self.deny_login(&verified.identity, &email).await);
        }

        if let Some(verifier) = &self.verifier {
            match verifier.verify_admin(&verified.id_token).await {
                Ok(true) => {}
                Ok(false) => {
                    self.force_sign_out(&verified.identity).await;
                    return Err(self.fail_login(AuthError::Unknown));
                }
                Err(err) => {
                    tracing::warn!(
                        target: "auth.login.failed",
                        error = %err,
                        "Remote admin verification unreachable"
                    );
                    self.force_sign_out(&verified.identity).await;
                    return Err(self.fail_login(AuthError::ServiceUnavailable));
                }
            }
        }

        if let Err(err) = self
            .store_call(self.tokens.put(ADMIN_TOKEN_KEY, &verified.id_token))
            .await
        {
            self.force_sign_out(&verified.identity).await;
            return Err(self.fail_login(err));
        }

        let session = self.set_session(|s| {
            s.state = SessionState::Authenticated;
            s.identity = Some(verified.identity.clone());
            s.email = Some(email.clone());
            s.is_authorized_admin = true;
            s.is_loading = false;
            s.last_error = None;
        });

        tracing::info!(
            target: "auth.login.succeeded",
            email = %email,
            "Administrator signed in"
        );

        Ok(session)
    }

    /// Sign out.
    ///
    /// Never fails observably: provider errors are logged and swallowed, and
    /// local state and the persisted token are always cleared.
    pub async fn logout(&self) {
        let identity = self.session.lock().unwrap().identity.clone();

        if let Some(identity) = identity {
            self.force_sign_out(&identity).await;
        }
        self.clear_token().await;

        self.set_session(|s| *s = Session::unauthenticated(None));
        tracing::info!(target: "auth.logout", "Signed out");
    }

    /// Apply one provider session-change notification.
    ///
    /// On `Appeared` (fresh sign-in or a stored session rehydrated at
    /// startup) the domain check reruns against the current allow-list
    /// snapshot; a domain removed since the last login signs the session
    /// out. On `Disappeared` the local session is cleared.
    pub async fn handle_change(&self, change: SessionChange) {
        match change {
            SessionChange::Appeared(identity) => self.handle_appeared(identity).await,
            SessionChange::Disappeared => {
                self.clear_token().await;
                self.set_session(|s| *s = Session::unauthenticated(None));
                tracing::debug!(target: "auth.session.cleared", "Provider session disappeared");
            }
        }
    }

    async fn handle_appeared(&self, identity: Identity) {
        let email = identity.email.trim().to_lowercase();

        self.set_session(|s| {
            s.is_loading = true;
        });

        let snapshot = match self
            .store_call(self.allow_list.fetch(&self.tenant_id))
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                // Fail closed: without a readable allow-list nobody is an
                // admin.
                self.force_sign_out(&identity).await;
                self.clear_token().await;
                self.set_session(|s| *s = Session::unauthenticated(Some(err.user_message())));
                return;
            }
        };

        if !is_email_domain_allowed(&email, &snapshot.domains) {
            tracing::warn!(
                target: "auth.session.appeared",
                email = %email,
                "Rehydrated session has a disallowed domain; signing out"
            );
            self.force_sign_out(&identity).await;
            self.clear_token().await;
            self.set_session(|s| {
                *s = Session::unauthenticated(Some(AuthError::DomainNotAllowed.user_message()))
            });
            return;
        }

        let token = match self.provider_call(self.provider.get_id_token(&identity)).await {
            Ok(token) => token,
            Err(err) => {
                self.force_sign_out(&identity).await;
                self.clear_token().await;
                self.set_session(|s| *s = Session::unauthenticated(Some(err.user_message())));
                return;
            }
        };
        if let Err(err) = self.store_call(self.tokens.put(ADMIN_TOKEN_KEY, &token)).await {
            self.force_sign_out(&identity).await;
            self.set_session(|s| *s = Session::unauthenticated(Some(err.user_message())));
            return;
        }

        tracing::info!(
            target: "auth.session.appeared",
            email = %email,
            "Provider session verified"
        );
        self.set_session(|s| {
            s.state = SessionState::Authenticated;
            s.identity = Some(identity.clone());
            s.email = Some(email.clone());
            s.is_authorized_admin = true;
            s.is_loading = false;
            s.last_error = None;
        });
    }

    /// Domain check failed after valid credentials: force sign-out at the
    /// provider, drop any persisted token, and walk
    /// `Denied -> Unauthenticated`.
    async fn deny_login(&self, identity: &Identity, email: &str) -> AuthError {
        let err = AuthError::DomainNotAllowed;

        tracing::warn!(
            target: "auth.login.denied",
            email = %email,
            "Domain not on allow-list; invalidating provider session"
        );

        self.force_sign_out(identity).await;
        self.clear_token().await;

        self.set_session(|s| {
            s.state = SessionState::Denied;
            s.identity = None;
            s.email = None;
            s.is_authorized_admin = false;
            s.is_loading = false;
            s.last_error = Some(err.user_message());
        });
        self.set_session(|s| {
            s.state = SessionState::Unauthenticated;
        });

        err
    }

    /// Record a login failure: session back to unauthenticated, loading
    /// cleared, and the normalized message stored.
    fn fail_login(&self, err: AuthError) -> AuthError {
        tracing::warn!(
            target: "auth.login.failed",
            error = %err,
            "Login attempt failed"
        );
        self.set_session(|s| *s = Session::unauthenticated(Some(err.user_message())));
        err
    }

    /// Provider sign-out that never propagates: failures are logged only.
    async fn force_sign_out(&self, identity: &Identity) {
        match timeout(self.call_timeout, self.provider.invalidate_session(identity)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(
                    target: "auth.logout",
                    error = %err,
                    "Provider sign-out failed; clearing local state regardless"
                );
            }
            Err(_) => {
                tracing::warn!(
                    target: "auth.logout",
                    "Provider sign-out timed out; clearing local state regardless"
                );
            }
        }
    }

    async fn clear_token(&self) {
        if let Err(err) = self.tokens.remove(ADMIN_TOKEN_KEY).await {
            tracing::warn!(
                target: "auth.logout",
                error = %err,
                "Failed to remove persisted token"
            );
        }
    }

    async fn provider_call<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, AuthError> {
        match timeout(self.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(AuthError::from_provider(err)),
            Err(_) => Err(AuthError::ServiceUnavailable),
        }
    }

    async fn store_call<T>(
        &self,
        fut: impl std::future::Future<Output = crate::error::Result<T>>,
    ) -> Result<T, AuthError> {
        match timeout(self.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::warn!(target: "auth.login.failed", error = %err, "Store call failed");
                Err(AuthError::ServiceUnavailable)
            }
            Err(_) => Err(AuthError::ServiceUnavailable),
        }
    }

    /// Mutate the session under the lock, then publish the new snapshot.
    /// The lock is never held across an await.
    fn set_session(&self, apply: impl FnOnce(&mut Session)) -> Session {
        let snapshot = {
            let mut session = self.session.lock().unwrap();
            apply(&mut session);
            session.clone()
        };
        self.publish.send_replace(snapshot.clone());
        snapshot
    }
}
