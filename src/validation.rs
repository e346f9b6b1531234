//! Custom validators for request payloads
//!
//! These extend the `validator` crate with the domain-specific rules the
//! allow-list needs.

use validator::ValidationError;

/// Validates that a string is a plausible DNS domain name
/// (e.g. `tint.edu.in`)
///
/// Rules: dot-separated labels of alphanumerics with inner hyphens, at least
/// two labels, an alphabetic top-level label of two or more characters, no
/// spaces, no leading or trailing dot.
pub fn validate_domain_name(domain: &str) -> Result<(), ValidationError> {
    if domain.is_empty() {
        let mut err = ValidationError::new("domain");
        err.message = Some(std::borrow::Cow::Borrowed("cannot be empty"));
        return Err(err);
    }

    if domain.len() > 253 {
        let mut err = ValidationError::new("domain");
        err.message = Some(std::borrow::Cow::Borrowed("must be 253 characters or less"));
        return Err(err);
    }

    if domain.contains(char::is_whitespace) {
        let mut err = ValidationError::new("domain");
        err.message = Some(std::borrow::Cow::Borrowed("cannot contain spaces"));
        return Err(err);
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        let mut err = ValidationError::new("domain");
        err.message = Some(std::borrow::Cow::Borrowed("cannot start or end with a dot"));
        return Err(err);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        let mut err = ValidationError::new("domain");
        err.message = Some(std::borrow::Cow::Borrowed(
            "must have at least two labels, e.g. tint.edu.in",
        ));
        return Err(err);
    }

    for label in &labels {
        let valid = !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            let mut err = ValidationError::new("domain");
            err.message = Some(std::borrow::Cow::Borrowed(
                "labels must be alphanumeric with inner hyphens",
            ));
            return Err(err);
        }
    }

    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        let mut err = ValidationError::new("domain");
        err.message = Some(std::borrow::Cow::Borrowed(
            "top-level label must be alphabetic and at least two characters",
        ));
        return Err(err);
    }

    Ok(())
}
