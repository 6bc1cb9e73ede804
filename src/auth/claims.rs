/// JWT Claims structure
///
/// The signed payload of an access token. The expiry lives inside the signed
/// payload, so it cannot be extended without invalidating the signature.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username). Empty when the token carried none.
    #[serde(default)]
    pub sub: String,
    /// Expiration time (Unix timestamp, UTC)
    pub exp: i64,
    /// Issued at (Unix timestamp, UTC)
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// Create claims for `subject` expiring `ttl` from now
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Option<Self> {
        Self::issued_at(subject, ttl, Utc::now())
    }

    /// Create claims as if issued at `now`.
    ///
    /// `None` when `now + ttl` falls outside the representable date range.
    pub fn issued_at(
        subject: impl Into<String>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let expires = now.checked_add_signed(ttl)?;
        Some(Self {
            sub: subject.into(),
            exp: expires.timestamp(),
            iat: now.timestamp(),
        })
    }

    pub fn subject(&self) -> Option<&str> {
        if self.sub.is_empty() {
            None
        } else {
            Some(&self.sub)
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("alice", Duration::minutes(60)).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_in_the_past_are_expired() {
        let issued = Utc::now() - Duration::minutes(30);
        let claims = Claims::issued_at("alice", Duration::minutes(15), issued).unwrap();

        assert!(claims.is_expired());
        assert_eq!(claims.iat, issued.timestamp());
    }

    #[test]
    fn test_empty_subject() {
        let claims = Claims::new("", Duration::minutes(1)).unwrap();
        assert_eq!(claims.subject(), None);
        let bob = Claims::new("bob", Duration::minutes(1)).unwrap();
        assert_eq!(bob.subject(), Some("bob"));
    }

    #[test]
    fn test_out_of_range_expiry_yields_none() {
        assert!(Claims::new("alice", Duration::MAX).is_none());
        assert!(Claims::issued_at("alice", Duration::days(365 * 300_000), Utc::now()).is_none());
    }

    #[test]
    fn test_missing_subject_deserializes_as_empty() {
        let claims: Claims = serde_json::from_str(r#"{"exp": 1700000000}"#).unwrap();
        assert_eq!(claims.subject(), None);
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }
}
