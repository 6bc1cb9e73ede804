/// Input validators for credential records
/// 1. Email syntax check (RFC 5322 simplified)
/// 2. Username sanity check (non-empty, bounded, no control characters)

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_USERNAME_LENGTH: usize = 256;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address
/// - Checks format using RFC 5322 simplified regex
/// - Verifies length constraints
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    // Local part over 64 octets is not deliverable
    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > 64 {
            return Err(ValidationError::SuspiciousContent("email".to_string()));
        }
    }

    Ok(trimmed.to_string())
}

/// Validates a username as stored in the credential source
///
/// Usernames are matched exactly and case-sensitively, so no trimming or
/// case folding happens here.
pub fn is_valid_username(username: &str) -> Result<&str, ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }

    if username.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("username".to_string()));
    }

    Ok(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("alice@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(is_valid_email(&long_local).is_err());
    }

    #[test]
    fn test_email_is_trimmed() {
        assert_eq!(is_valid_email("  bob@example.com ").unwrap(), "bob@example.com");
    }

    #[test]
    fn test_valid_username() {
        assert!(is_valid_username("alice").is_ok());
        assert!(is_valid_username("Alice.Smith-2").is_ok());
    }

    #[test]
    fn test_invalid_username() {
        assert!(is_valid_username("").is_err());
        assert!(is_valid_username("bad\nname").is_err());
        assert!(is_valid_username(&"a".repeat(257)).is_err());
    }
}
