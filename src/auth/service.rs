/// Authentication Service
///
/// Ties the credential store, password verification and the token codec
/// together. One instance is built at startup and shared by every caller.
///
/// Login checks only the password; the disabled flag is enforced when a token
/// is resolved back into an identity.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use crate::auth::jwt::TokenCodec;
use crate::auth::password::{verify_against_dummy, verify_password};
use crate::auth::store::{CredentialRecord, CredentialStore};
use crate::configuration::TokenSettings;
use crate::error::{AppError, AuthError, TokenError};

pub const TOKEN_TYPE: &str = "bearer";

/// Token issuance response
#[derive(Debug, Serialize, Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// Client-facing view of a credential record (no password hash)
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub disabled: bool,
}

impl From<&CredentialRecord> for UserProfile {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            username: record.username.clone(),
            full_name: record.full_name.clone(),
            email: record.email.clone(),
            disabled: !record.is_active(),
        }
    }
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    access_token_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, settings: &TokenSettings) -> Self {
        Self {
            store,
            codec: TokenCodec::new(settings),
            access_token_ttl: settings.access_token_ttl,
        }
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Check a username/password pair
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` for an unknown user and for a wrong
    /// password alike. Both paths run one bcrypt verification.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialRecord, AuthError> {
        let record = match self.store.lookup(username) {
            Some(record) => record,
            None => {
                verify_against_dummy(password);
                tracing::warn!(username = %username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &record.hashed_password) {
            tracing::warn!(username = %username, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::debug!(username = %username, "Credentials verified");
        Ok(record)
    }

    /// Mint an access token for `username`
    ///
    /// Does not check that the user exists; call after `authenticate`.
    /// `ttl` defaults to the configured access token lifetime.
    pub fn issue_token(
        &self,
        username: &str,
        ttl: Option<Duration>,
    ) -> Result<AccessToken, AppError> {
        let ttl = ttl.unwrap_or(self.access_token_ttl);
        let access_token = self.codec.encode(username, ttl)?;

        tracing::info!(
            username = %username,
            ttl_seconds = ttl.num_seconds(),
            "Access token issued"
        );

        Ok(AccessToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Resolve a bearer token to the stored identity
    ///
    /// # Errors
    /// - `InvalidToken(_)`: the token failed to decode
    /// - `UnknownSubject`: no subject, or one the store does not know
    /// - `AccountInactive`: the user exists but is disabled
    pub fn resolve_identity(&self, token: &str) -> Result<CredentialRecord, AuthError> {
        let claims = self.codec.decode(token).map_err(|e| {
            match e {
                TokenError::Expired => tracing::info!("Expired token presented"),
                _ => tracing::warn!(reason = %e, "Token rejected"),
            }
            AuthError::InvalidToken(e)
        })?;

        let username = claims.subject().ok_or_else(|| {
            tracing::warn!("Token carries no subject");
            AuthError::UnknownSubject
        })?;

        let record = self.store.lookup(username).ok_or_else(|| {
            tracing::warn!(username = %username, "Token subject not found");
            AuthError::UnknownSubject
        })?;

        if !record.is_active() {
            tracing::warn!(username = %username, "Token presented for inactive user");
            return Err(AuthError::AccountInactive);
        }

        Ok(record)
    }
}
