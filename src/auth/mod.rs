/// Authentication module
///
/// Password hashing, the credential store, JWT encoding/decoding,
/// and the service that ties them together.

mod claims;
mod jwt;
mod password;
mod service;
mod store;

pub use claims::Claims;
pub use jwt::TokenCodec;
pub use password::hash_password;
pub use password::hash_password_with_cost;
pub use password::verify_password;
pub use service::{AccessToken, AuthService, UserProfile, TOKEN_TYPE};
pub use store::load_credentials_file;
pub use store::{CredentialRecord, CredentialStore, InMemoryCredentialStore};
