/// Credential Store
///
/// Lookup of user records by username. The bundled implementation keeps every
/// record in memory and is loaded once from a JSON file at startup:
///
/// ```json
/// { "users": { "alice": { "username": "alice", "hashed_password": "$2b$...",
///                         "full_name": "Alice", "email": "alice@example.com",
///                         "disabled": false } } }
/// ```
///
/// Usernames match exactly and case-sensitively ("Alice" is not "alice").

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::Deserialize;

use crate::configuration::CredentialSettings;
use crate::error::{AppError, StoreError};
use crate::validators::{is_valid_email, is_valid_username};

/// Pluggable lookup-by-username
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive match. No side effects.
    fn lookup(&self, username: &str) -> Option<CredentialRecord>;
}

/// A stored user. The password hash is only reachable inside the crate and is
/// redacted from `Debug`; records are never serialized.
#[derive(Clone, Deserialize)]
pub struct CredentialRecord {
    pub username: String,
    #[serde(alias = "hashedPassword")]
    pub(crate) hashed_password: String,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    disabled: Option<bool>,
}

impl CredentialRecord {
    pub fn new(username: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            hashed_password: hashed_password.into(),
            full_name: None,
            email: None,
            disabled: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn is_active(&self) -> bool {
        !self.disabled.unwrap_or(false)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("hashed_password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: HashMap<String, serde_json::Value>,
}

/// In-memory store. Reads clone the current snapshot; writes swap in a new one.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<Arc<HashMap<String, CredentialRecord>>>,
}

impl InMemoryCredentialStore {
    pub fn new(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|record| (record.username.clone(), record))
            .collect::<HashMap<_, _>>();
        Self {
            users: RwLock::new(Arc::new(users)),
        }
    }

    /// Build the store described by `settings`.
    ///
    /// A missing, unreadable or corrupt file yields an empty store unless
    /// `require_file` is set, in which case the error is returned.
    pub fn from_settings(settings: &CredentialSettings) -> Result<Self, AppError> {
        match load_credentials_file(&settings.path) {
            Ok(users) => {
                tracing::info!(
                    path = %settings.path.display(),
                    users = users.len(),
                    "Credential store loaded"
                );
                Ok(Self {
                    users: RwLock::new(Arc::new(users)),
                })
            }
            Err(e) if settings.require_file => Err(e.into()),
            Err(e @ StoreError::Missing(_)) => {
                tracing::warn!(error = %e, "Starting with an empty credential store");
                Ok(Self::default())
            }
            Err(e) => {
                tracing::error!(error = %e, "Starting with an empty credential store");
                Ok(Self::default())
            }
        }
    }

    /// Insert or replace a record
    pub fn upsert(&self, record: CredentialRecord) {
        let mut guard = self.users.write().unwrap_or_else(|e| e.into_inner());
        let mut next = HashMap::clone(&guard);
        next.insert(record.username.clone(), record);
        *guard = Arc::new(next);
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<HashMap<String, CredentialRecord>> {
        self.users.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn lookup(&self, username: &str) -> Option<CredentialRecord> {
        self.snapshot().get(username).cloned()
    }
}

/// Read and validate a credential file.
///
/// Invalid entries are skipped with a warning: fields of the wrong shape,
/// empty or malformed username, a map key that differs from the record's
/// username, or an invalid email.
pub fn load_credentials_file(path: &Path) -> Result<HashMap<String, CredentialRecord>, StoreError> {
    if !path.exists() {
        return Err(StoreError::Missing(path.display().to_string()));
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| StoreError::Unreadable(format!("{}: {}", path.display(), e)))?;
    let file: CredentialFile = serde_json::from_str(&raw)
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?;

    let mut users = HashMap::with_capacity(file.users.len());
    for (key, value) in file.users {
        let mut record = match serde_json::from_value::<CredentialRecord>(value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(entry = %key, error = %e, "Skipping credential entry");
                continue;
            }
        };
        if let Err(e) = is_valid_username(&record.username) {
            tracing::warn!(entry = %key, error = %e, "Skipping credential entry");
            continue;
        }
        if key != record.username {
            tracing::warn!(
                entry = %key,
                username = %record.username,
                "Skipping credential entry whose key does not match its username"
            );
            continue;
        }
        if let Some(email) = record.email.as_deref() {
            match is_valid_email(email) {
                Ok(normalized) => record.email = Some(normalized),
                Err(e) => {
                    tracing::warn!(entry = %key, error = %e, "Skipping credential entry");
                    continue;
                }
            }
        }
        users.insert(key, record);
    }

    Ok(users)
}
