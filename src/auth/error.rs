//! Login-path error taxonomy.
//!
//! Every failure on the login path is normalized here before it leaves the
//! session manager. Callers see exactly one human-readable message per
//! failed attempt and never a raw provider code.

use crate::error::StallboardError;

use super::identity::ProviderError;

/// Errors surfaced by login and the session-change re-check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Malformed input, rejected before the identity provider is contacted.
    #[error("{0}")]
    Validation(String),

    /// No account exists for the given email.
    #[error("No account was found for this email address")]
    AccountNotFound,

    /// The email/password pair was rejected.
    #[error("Incorrect email or password")]
    InvalidCredential,

    /// The provider throttled the attempt.
    #[error("Too many attempts. Please wait a moment and try again")]
    RateLimited,

    /// Credentials were valid but the email domain is not on the allow-list.
    #[error("Access denied: this email domain is not authorized")]
    DomainNotAllowed,

    /// The provider or the allow-list store could not be reached.
    #[error("Service is temporarily unavailable. Please try again")]
    ServiceUnavailable,

    /// Anything the taxonomy does not cover.
    #[error("Login failed. Please try again")]
    Unknown,
}

impl AuthError {
    /// The single user-facing message for this failure.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Translate a provider-specific failure into the login taxonomy.
    pub fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::AccountNotFound => Self::AccountNotFound,
            ProviderError::InvalidCredential => Self::InvalidCredential,
            ProviderError::RateLimited => Self::RateLimited,
            ProviderError::Unavailable(_) => Self::ServiceUnavailable,
            ProviderError::Other(_) => Self::Unknown,
        }
    }
}

impl From<AuthError> for StallboardError {
    fn from(err: AuthError) -> Self {
        let message = err.user_message();
        match err {
            AuthError::Validation(_) => StallboardError::BadRequest(message),
            AuthError::RateLimited => StallboardError::TooManyRequests(message),
            AuthError::ServiceUnavailable => StallboardError::ServiceUnavailable(message),
            AuthError::AccountNotFound
            | AuthError::InvalidCredential
            | AuthError::DomainNotAllowed
            | AuthError::Unknown => StallboardError::Unauthorized(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_translation() {
        assert_eq!(
            AuthError::from_provider(ProviderError::AccountNotFound),
            AuthError::AccountNotFound
        );
        assert_eq!(
            AuthError::from_provider(ProviderError::InvalidCredential),
            AuthError::InvalidCredential
        );
        assert_eq!(
            AuthError::from_provider(ProviderError::RateLimited),
            AuthError::RateLimited
        );
        assert_eq!(
            AuthError::from_provider(ProviderError::Unavailable("down".into())),
            AuthError::ServiceUnavailable
        );
        assert_eq!(
            AuthError::from_provider(ProviderError::Other("???".into())),
            AuthError::Unknown
        );
    }

    #[test]
    fn test_messages_never_leak_provider_codes() {
        for err in [
            AuthError::AccountNotFound,
            AuthError::InvalidCredential,
            AuthError::RateLimited,
            AuthError::DomainNotAllowed,
            AuthError::ServiceUnavailable,
            AuthError::Unknown,
        ] {
            let msg = err.user_message();
            assert!(!msg.is_empty());
            assert!(!msg.contains("auth/"), "provider-style code in {:?}", msg);
        }
    }
}
