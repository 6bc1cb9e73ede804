//! Error handling for the authentication service.
//!
//! 1. Domain-specific error types (tokens, authentication, configuration,
//!    credential store, validation, quote fetching)
//! 2. A unified `AppError` used for control flow with `?`
//! 3. HTTP response mapping with structured logging

use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
        }
    }
}

impl StdError for ValidationError {}

/// Outcome of a failed token decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not match the payload under the configured key/algorithm
    InvalidSignature,
    /// Signature is valid but the embedded expiry has passed
    Expired,
    /// Token could not be parsed into the expected structure
    Malformed,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "Token signature is invalid"),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Malformed => write!(f, "Token is malformed"),
        }
    }
}

impl StdError for TokenError {}

/// Authentication and authorization errors
///
/// Every variant except `AccountInactive` means "unauthenticated".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password. The two are deliberately not told apart.
    InvalidCredentials,
    MissingToken,
    InvalidToken(TokenError),
    /// Token decoded fine but names no subject, or a subject the store does not know
    UnknownSubject,
    AccountInactive,
}

impl AuthError {
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, AuthError::AccountInactive)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Incorrect username or password"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::InvalidToken(e) => write!(f, "Invalid token: {}", e),
            AuthError::UnknownSubject => write!(f, "Token subject is not a known user"),
            AuthError::AccountInactive => write!(f, "Inactive user"),
        }
    }
}

impl StdError for AuthError {}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::InvalidToken(err)
    }
}

/// Configuration errors
///
/// Messages name the offending key, never the configured value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    UnsupportedAlgorithm(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(key) => write!(f, "Missing required config: {}", key),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::UnsupportedAlgorithm(name) => {
                write!(f, "Unsupported signing algorithm: {}", name)
            }
        }
    }
}

impl StdError for ConfigError {}

/// Credential store loading errors
#[derive(Debug)]
pub enum StoreError {
    Missing(String),
    Unreadable(String),
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Missing(path) => write!(f, "Credential file not found: {}", path),
            StoreError::Unreadable(msg) => write!(f, "Credential file unreadable: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "Credential file corrupt: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Quote fetching errors
#[derive(Debug)]
pub enum QuoteError {
    Http(String),
    Status(u16),
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteError::Http(msg) => write!(f, "Quote request failed: {}", msg),
            QuoteError::Status(code) => write!(f, "Quote source returned status {}", code),
        }
    }
}

impl StdError for QuoteError {}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => QuoteError::Status(status.as_u16()),
            None => QuoteError::Http(err.to_string()),
        }
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Auth(AuthError),
    Config(ConfigError),
    Store(StoreError),
    Quote(QuoteError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Quote(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Auth(AuthError::InvalidToken(err))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        AppError::Quote(err)
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                e.to_string(),
            ),

            // Authentication errors -> 401, inactive account -> 400
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS".to_string(),
                    "Incorrect username or password".to_string(),
                ),
                AuthError::MissingToken => (
                    StatusCode::UNAUTHORIZED,
                    "MISSING_TOKEN".to_string(),
                    "Not authenticated".to_string(),
                ),
                AuthError::InvalidToken(_) | AuthError::UnknownSubject => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_INVALID".to_string(),
                    "Could not validate credentials".to_string(),
                ),
                AuthError::AccountInactive => (
                    StatusCode::BAD_REQUEST,
                    "ACCOUNT_INACTIVE".to_string(),
                    "Inactive user".to_string(),
                ),
            },

            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR".to_string(),
                "Server configuration error".to_string(),
            ),

            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR".to_string(),
                "Credential store unavailable".to_string(),
            ),

            AppError::Quote(_) => (
                StatusCode::BAD_GATEWAY,
                "QUOTE_SOURCE_ERROR".to_string(),
                "Quote source unavailable".to_string(),
            ),

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal server error".to_string(),
            ),
        };

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code,
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Auth(AuthError::InvalidToken(TokenError::Expired)) => {
                tracing::info!(request_id = request_id, "Expired token presented");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Store(e) => {
                tracing::error!(request_id = request_id, error = %e, "Credential store error");
            }
            AppError::Quote(e) => {
                tracing::error!(request_id = request_id, error = %e, "Quote source error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::AccountInactive) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Quote(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_token_error_converts_to_auth_error() {
        let app_err: AppError = TokenError::Expired.into();
        match app_err {
            AppError::Auth(AuthError::InvalidToken(TokenError::Expired)) => (),
            other => panic!("Expected expired token error, got {:?}", other),
        }
    }

    #[test]
    fn test_inactive_is_not_unauthenticated() {
        assert!(!AuthError::AccountInactive.is_unauthenticated());
        assert!(AuthError::InvalidCredentials.is_unauthenticated());
        assert!(AuthError::UnknownSubject.is_unauthenticated());
        assert!(AuthError::InvalidToken(TokenError::Malformed).is_unauthenticated());
    }

    #[test]
    fn test_unauthenticated_maps_to_401_with_challenge() {
        let err = AppError::Auth(AuthError::InvalidToken(TokenError::InvalidSignature));
        let response = ResponseError::error_response(&err);

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_inactive_maps_to_400_without_challenge() {
        let err = AppError::Auth(AuthError::AccountInactive);
        let response = ResponseError::error_response(&err);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AppError::Config(ConfigError::InvalidValue("auth.secret_key".to_string()));
        let (status, body) = ErrorHandler::error_response(&err, "req-1");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Server configuration error");
        assert_eq!(body.error_id, "req-1");
    }

    #[test]
    fn test_error_response_creation() {
        let response = ErrorResponse::new(
            "test-123".to_string(),
            "Test error".to_string(),
            "TEST_ERROR".to_string(),
            400,
        );

        assert_eq!(response.error_id, "test-123");
        assert_eq!(response.code, "TEST_ERROR");
        assert_eq!(response.status, 400);
    }
}
