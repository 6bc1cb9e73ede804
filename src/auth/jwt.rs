/// JWT Token Generation and Validation
///
/// `TokenCodec` signs claims into compact JWS strings and verifies them back.
/// Keys and validation rules are built once from `TokenSettings`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::TokenSettings;
use crate::error::{AppError, TokenError};

pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(settings: &TokenSettings) -> Self {
        // Pinned to the configured algorithm; the token header cannot pick another.
        let mut validation = Validation::new(settings.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            algorithm: settings.algorithm,
            encoding_key: EncodingKey::from_secret(settings.secret_key.expose()),
            decoding_key: DecodingKey::from_secret(settings.secret_key.expose()),
            validation,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sign a token for `subject` that expires `ttl` from now (UTC)
    ///
    /// # Errors
    /// Returns error if token serialization or signing fails
    pub fn encode(&self, subject: &str, ttl: Duration) -> Result<String, AppError> {
        self.encode_at(subject, ttl, Utc::now())
    }

    /// Sign a token as if issued at `now`
    pub fn encode_at(
        &self,
        subject: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims::issued_at(subject, ttl, now).ok_or_else(|| {
            AppError::Internal("Token expiry is out of range".to_string())
        })?;
        self.encode_claims(&claims)
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify the signature, then the expiry, and return the claims
    ///
    /// # Errors
    /// - `InvalidSignature`: signature mismatch or a different algorithm in the header
    /// - `Expired`: signature is valid but `exp` is in the past
    /// - `Malformed`: anything that does not parse as a token with an `exp` claim
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let outcome = match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenError::InvalidSignature
                    }
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                };
                tracing::debug!(error = %e, outcome = %outcome, "JWT validation error");
                outcome
            })
    }
}
