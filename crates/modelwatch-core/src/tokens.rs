//! Bearer credential type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque bearer token authorizing requests to the platform API.
///
/// The token is treated as opaque: it is never parsed or inspected, only
/// carried in `Authorization` headers and the persistence slot.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Serde support exists solely for the token store; do not serialize
///   tokens into anything user-visible
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP authorization headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for AccessToken {}

impl PartialEq<str> for AccessToken {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AccessToken {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hides_value_in_debug() {
        let token = AccessToken::new("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("eyJ"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn token_compares_with_str() {
        let token = AccessToken::new("T1");
        assert_eq!(token, "T1");
        assert_ne!(token, "T2");
    }

    #[test]
    fn token_round_trips_through_serde() {
        let token = AccessToken::new("T1");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"T1\"");
        let back: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
