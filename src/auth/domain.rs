//! Email-domain checks shared by login and session rehydration.

use super::error::AuthError;

/// Returns true iff the domain segment of `email` matches an allow-list
/// entry exactly (case-insensitive).
///
/// The comparison splits precisely on the `@` separator and compares the
/// full domain segment. A suffix match on the whole address would wrongly
/// admit `user@evil-tint.edu.in` when `tint.edu.in` is allowed, so only an
/// exact match counts.
pub fn is_email_domain_allowed(email: &str, domains: &[String]) -> bool {
    let Some(email_domain) = domain_of(email) else {
        return false;
    };

    domains
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&email_domain))
}

/// Extract the lowercased domain segment of an email address.
///
/// Returns `None` unless the address contains exactly one `@` with a
/// non-empty segment on each side.
pub fn domain_of(email: &str) -> Option<String> {
    let mut parts = email.split('@');
    let local = parts.next()?;
    let domain = parts.next()?;

    if parts.next().is_some() || local.is_empty() || domain.is_empty() {
        return None;
    }

    Some(domain.to_ascii_lowercase())
}

/// Syntactic check applied before the identity provider is contacted.
///
/// Requires the conventional `local@domain.tld` shape: a single `@`, a
/// non-empty local part, and a domain containing a dot with non-empty
/// labels around it.
pub fn validate_login_email(email: &str) -> Result<(), AuthError> {
    let Some(domain) = domain_of(email) else {
        return Err(AuthError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    };

    let has_dotted_domain = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains(' ');

    if !has_dotted_domain {
        return Err(AuthError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_exact_domain_match() {
        let allowed = domains(&["tint.edu.in"]);
        assert!(is_email_domain_allowed("a@tint.edu.in", &allowed));
        assert!(is_email_domain_allowed("A@TINT.EDU.IN", &allowed));
    }

    #[test]
    fn test_suffix_lookalikes_are_rejected() {
        let allowed = domains(&["tint.edu.in"]);
        // Ends with the allowed entry as a substring but is a different domain.
        assert!(!is_email_domain_allowed("a@evil-tint.edu.in", &allowed));
        assert!(!is_email_domain_allowed("a@xtint.edu.in", &allowed));
        assert!(!is_email_domain_allowed("a@tint.edu.in.evil.com", &allowed));
    }

    #[test]
    fn test_multiple_allowed_domains() {
        let allowed = domains(&["tint.edu.in", "nitk.ac.in"]);
        assert!(is_email_domain_allowed("x@nitk.ac.in", &allowed));
        assert!(!is_email_domain_allowed("x@iitb.ac.in", &allowed));
    }

    #[test]
    fn test_malformed_addresses_never_match() {
        let allowed = domains(&["tint.edu.in"]);
        assert!(!is_email_domain_allowed("tint.edu.in", &allowed));
        assert!(!is_email_domain_allowed("@tint.edu.in", &allowed));
        assert!(!is_email_domain_allowed("a@b@tint.edu.in", &allowed));
        assert!(!is_email_domain_allowed("", &allowed));
    }

    #[test]
    fn test_login_email_validation() {
        assert!(validate_login_email("a@tint.edu.in").is_ok());

        assert!(validate_login_email("no-at-sign").is_err());
        assert!(validate_login_email("a@nodot").is_err());
        assert!(validate_login_email("a@.edu").is_err());
        assert!(validate_login_email("a@edu.").is_err());
        assert!(validate_login_email("@tint.edu.in").is_err());
        assert!(validate_login_email("").is_err());
    }
}
