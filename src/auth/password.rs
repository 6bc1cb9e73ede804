/// Password Hashing and Verification
///
/// Passwords are hashed with bcrypt (adaptive cost, random salt). The cost and
/// salt are embedded in the hash string, so verification needs nothing else.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::error::{AppError, ValidationError};

/// bcrypt only reads this many bytes of input; anything past it would be ignored.
pub const MAX_PASSWORD_BYTES: usize = 72;

lazy_static! {
    /// Verified against when the username is unknown, so both login failures
    /// spend the same bcrypt work.
    static ref DUMMY_HASH: String =
        hash("dummy-password-for-unknown-users", DEFAULT_COST).unwrap_or_default();
}

/// Hash a password using bcrypt at the default cost
///
/// Empty passwords are hashed like any other input. Passwords longer than
/// `MAX_PASSWORD_BYTES` are rejected.
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash a password using bcrypt at an explicit cost (4..=31)
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        )));
    }
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// The digest comparison inside bcrypt is constant-time. A hash that cannot be
/// parsed yields `false` rather than an error, as does a password longer than
/// `MAX_PASSWORD_BYTES` (no stored hash can have come from one).
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    if password.len() > MAX_PASSWORD_BYTES {
        return false;
    }
    match verify(password, hashed_password) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}

/// Burn one bcrypt verification without a stored record
pub fn verify_against_dummy(password: &str) {
    let _ = verify_password(password, &DUMMY_HASH);
}
