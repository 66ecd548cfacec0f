//! Input validation helpers shared by the login flow and the
//! administrative configuration-test surface.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Syntax gate only; deliverability is the vendor's problem.
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
});

/// Check email syntax. Deliberately permissive: one `@`-separated local
/// part, a dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_addresses() {
        for email in [
            "jane@x.com",
            "jane.doe@clinic.example.org",
            "j+tag@sub.domain.co",
        ] {
            assert!(is_valid_email(email), "{email}");
        }
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        for email in ["", "not-an-email", "a@b", "a b@x.com", "@x.com", "a@"] {
            assert!(!is_valid_email(email), "{email}");
        }
    }
}
