use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest password the identity provider accepts
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate password strength the way the managed identity service does:
/// at least six characters, nothing else.
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Email regex pattern for basic email validation
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Validate email format
pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Canonical form accounts are stored and looked up under
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_passwords() {
        assert!(validate_password("secret"));
        assert!(validate_password("Password1"));
        assert!(validate_password("pässwö"));
    }

    #[test]
    fn test_invalid_passwords() {
        assert!(!validate_password(""));
        assert!(!validate_password("pw"));
        assert!(!validate_password("12345"));
    }

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("a@b.com"));
        assert!(validate_email("user.name@example.co.uk"));
        assert!(validate_email("user+tag@example.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!validate_email("invalid"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("A@B.com"), "a@b.com");
        assert_eq!(normalize_email("user+Tag@Example.ORG"), "user+tag@example.org");
        assert_eq!(normalize_email("a@b.com"), "a@b.com");
    }
}
