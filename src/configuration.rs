use std::fmt;
use std::path::PathBuf;

use jsonwebtoken::Algorithm;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
    pub credentials: CredentialSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub project_name: String,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Location of the credential source
#[derive(serde::Deserialize, Clone, Debug)]
pub struct CredentialSettings {
    pub path: PathBuf,
    /// Fail startup instead of serving with an empty store when the file is absent or bad
    #[serde(default)]
    pub require_file: bool,
}

/// Shared signing secret. `Debug` never prints the value.
#[derive(serde::Deserialize, Clone)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// Token signing settings as read from configuration
#[derive(serde::Deserialize, Clone, Debug)]
pub struct AuthSettings {
    pub secret_key: SecretKey,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
}

/// Validated, immutable token settings handed to the codec and the service
#[derive(Clone, Debug)]
pub struct TokenSettings {
    pub secret_key: SecretKey,
    pub algorithm: Algorithm,
    pub access_token_ttl: chrono::Duration,
}

impl AuthSettings {
    /// Validate the raw settings once at startup.
    ///
    /// # Errors
    /// - empty secret key
    /// - unknown algorithm name, or one that does not sign with a shared secret
    /// - non-positive token lifetime, or one too large to put an expiry on
    pub fn token_settings(&self) -> Result<TokenSettings, ConfigError> {
        if self.secret_key.is_empty() {
            return Err(ConfigError::MissingRequired("auth.secret_key".to_string()));
        }

        let algorithm = parse_algorithm(&self.algorithm)?;

        if self.access_token_expire_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.access_token_expire_minutes must be positive".to_string(),
            ));
        }

        let access_token_ttl = chrono::Duration::try_minutes(self.access_token_expire_minutes)
            .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "auth.access_token_expire_minutes is out of range".to_string(),
                )
            })?;

        Ok(TokenSettings {
            secret_key: self.secret_key.clone(),
            algorithm,
            access_token_ttl,
        })
    }
}

/// Only HMAC algorithms are accepted since the key is a shared secret.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name.trim().parse::<Algorithm>() {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default("application.project_name", "OAuth Finance API")?
        .set_default("auth.algorithm", "HS256")?
        .set_default("auth.access_token_expire_minutes", 60)?
        .set_default("credentials.path", "data/credentials.json")?
        .set_default("credentials.require_file", false)?
        .add_source(config::File::with_name("configuration").required(false))
        // e.g. APP_AUTH__SECRET_KEY=... overrides auth.secret_key
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
