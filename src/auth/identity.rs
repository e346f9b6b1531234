//! Identity-provider seam.
//!
//! Credential verification, session issuance, and session-change
//! notification are fully delegated to an external identity service. This
//! module defines the surface the session manager consumes and an in-memory
//! implementation used by single-process deployments and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::token::generate_opaque_token;

/// Opaque handle to a provider-side session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider-assigned user id.
    pub uid: String,
    /// Email the provider verified for this session.
    pub email: String,
}

/// Result of a successful credential verification.
#[derive(Debug, Clone)]
pub struct VerifiedCredential {
    pub identity: Identity,
    /// Short-lived token for authenticated requests.
    pub id_token: String,
}

/// Provider-specific failures, translated into the login taxonomy at the
/// session-manager boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("account not found")]
    AccountNotFound,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("rate limited")]
    RateLimited,
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider error: {0}")]
    Other(String),
}

/// Asynchronous session-change notifications.
///
/// `Appeared` fires when a provider session appears, including when a stored
/// session is rehydrated at startup. `Disappeared` fires when the session
/// goes away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Appeared(Identity),
    Disappeared,
}

/// External identity service surface consumed by the session manager.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an email/password pair, establishing a provider session.
    async fn verify_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedCredential, ProviderError>;

    /// Force sign-out of the given provider session.
    async fn invalidate_session(&self, identity: &Identity) -> Result<(), ProviderError>;

    /// Fetch a fresh id token for an existing provider session.
    async fn get_id_token(&self, identity: &Identity) -> Result<String, ProviderError>;

    /// Subscribe to session-change notifications.
    ///
    /// The current session state is delivered immediately as the first
    /// event; dropping the receiver unsubscribes.
    fn subscribe_session_change(&self) -> mpsc::UnboundedReceiver<SessionChange>;
}

#[derive(Default)]
struct InMemoryProviderState {
    /// email -> password
    users: HashMap<String, String>,
    /// The provider-side session, if any.
    current: Option<Identity>,
    subscribers: Vec<mpsc::UnboundedSender<SessionChange>>,
    verify_calls: u64,
    fail_verify: Option<ProviderError>,
    fail_invalidate: bool,
}

/// In-memory identity provider.
///
/// Holds a fixed set of email/password accounts and a single provider-side
/// session, and pushes session-change events to subscribers the way the
/// hosted service does. Failure injection (`fail_next_verify`,
/// `fail_invalidation`) covers the unhappy paths in tests.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    state: RwLock<InMemoryProviderState>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account.
    pub fn add_user(&self, email: &str, password: &str) {
        self.state
            .write()
            .unwrap()
            .users
            .insert(email.trim().to_lowercase(), password.to_string());
    }

    /// Number of `verify_credential` calls made so far.
    pub fn verify_calls(&self) -> u64 {
        self.state.read().unwrap().verify_calls
    }

    /// Make the next `verify_credential` call fail with the given error.
    pub fn fail_next_verify(&self, err: ProviderError) {
        self.state.write().unwrap().fail_verify = Some(err);
    }

    /// Make `invalidate_session` calls fail until cleared.
    pub fn fail_invalidation(&self, enabled: bool) {
        self.state.write().unwrap().fail_invalidate = enabled;
    }

    /// Restore a stored session and notify subscribers, simulating the
    /// provider rehydrating a session at startup.
    pub fn restore_session(&self, email: &str) -> Identity {
        let identity = Identity {
            uid: Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
        };
        let mut state = self.state.write().unwrap();
        state.current = Some(identity.clone());
        Self::notify(&mut state, SessionChange::Appeared(identity.clone()));
        identity
    }

    /// The provider-side session, if one exists.
    pub fn current_session(&self) -> Option<Identity> {
        self.state.read().unwrap().current.clone()
    }

    fn notify(state: &mut InMemoryProviderState, change: SessionChange) {
        state
            .subscribers
            .retain(|tx| tx.send(change.clone()).is_ok());
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn verify_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedCredential, ProviderError> {
        let mut state = self.state.write().unwrap();
        state.verify_calls += 1;

        if let Some(err) = state.fail_verify.take() {
            return Err(err);
        }

        let email = email.trim().to_lowercase();
        let stored = state
            .users
            .get(&email)
            .ok_or(ProviderError::AccountNotFound)?;
        if stored != password {
            return Err(ProviderError::InvalidCredential);
        }

        let identity = Identity {
            uid: Uuid::new_v4().to_string(),
            email,
        };
        state.current = Some(identity.clone());
        Self::notify(&mut state, SessionChange::Appeared(identity.clone()));

        Ok(VerifiedCredential {
            identity,
            id_token: generate_opaque_token(),
        })
    }

    async fn invalidate_session(&self, identity: &Identity) -> Result<(), ProviderError> {
        let mut state = self.state.write().unwrap();

        if state.fail_invalidate {
            return Err(ProviderError::Unavailable("sign-out failed".to_string()));
        }

        let was_current = state
            .current
            .as_ref()
            .is_some_and(|c| c.uid == identity.uid);
        if was_current {
            state.current = None;
            Self::notify(&mut state, SessionChange::Disappeared);
        }
        Ok(())
    }

    async fn get_id_token(&self, identity: &Identity) -> Result<String, ProviderError> {
        let state = self.state.read().unwrap();
        let valid = state
            .current
            .as_ref()
            .is_some_and(|c| c.uid == identity.uid);
        if !valid {
            return Err(ProviderError::Other("no active session".to_string()));
        }
        Ok(generate_opaque_token())
    }

    fn subscribe_session_change(&self) -> mpsc::UnboundedReceiver<SessionChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.write().unwrap();

        // Deliver the current state immediately, mirroring providers that
        // replay the stored session to new subscribers.
        let initial = match &state.current {
            Some(identity) => SessionChange::Appeared(identity.clone()),
            None => SessionChange::Disappeared,
        };
        let _ = tx.send(initial);

        state.subscribers.push(tx);
        rx
    }
}
