//! Platform API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// All endpoints live under this versioned prefix.
const API_BASE_PATH: &str = "/api/v1";

/// A validated base URL of a modelwatch platform deployment.
///
/// Base URLs must use HTTPS (or HTTP for localhost, which keeps local
/// development and mock-server tests working). Endpoint URLs are derived
/// under the versioned `/api/v1` prefix.
///
/// # Example
///
/// ```
/// use modelwatch_core::ApiUrl;
///
/// let api = ApiUrl::new("https://api.modelwatch.dev").unwrap();
/// assert_eq!(api.endpoint_url("/auth/me"),
///            "https://api.modelwatch.dev/api/v1/auth/me");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl(Url);

impl ApiUrl {
    /// Create a new API URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ApiUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        // Normalize: remove trailing slash
        let normalized = if url.path() == "/" {
            let mut u = url.clone();
            u.set_path("");
            u
        } else {
            url
        };

        Ok(Self(normalized))
    }

    /// Returns the full URL for an endpoint path such as `/auth/me`.
    pub fn endpoint_url(&self, path: &str) -> String {
        // The URL crate always adds a trailing slash to root paths,
        // so trim it before appending the versioned prefix
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}{}{}", base, API_BASE_PATH, path)
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns the URL scheme (e.g., "https", "http").
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        // Must be absolute
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::ApiUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let scheme = url.scheme();

        // Must be HTTPS (or HTTP for localhost)
        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "::1");

        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(InvalidInputError::ApiUrl {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        // Must have a host
        if url.host_str().is_none() {
            return Err(InvalidInputError::ApiUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let api = ApiUrl::new("https://api.modelwatch.dev").unwrap();
        assert_eq!(api.host(), Some("api.modelwatch.dev"));
    }

    #[test]
    fn valid_localhost_http() {
        let api = ApiUrl::new("http://localhost:8000").unwrap();
        assert_eq!(api.host(), Some("localhost"));
    }

    #[test]
    fn endpoint_url_construction() {
        let api = ApiUrl::new("https://api.modelwatch.dev").unwrap();
        assert_eq!(
            api.endpoint_url("/auth/login/email"),
            "https://api.modelwatch.dev/api/v1/auth/login/email"
        );
    }

    #[test]
    fn normalizes_trailing_slash_in_endpoint_url() {
        let api = ApiUrl::new("https://api.modelwatch.dev/").unwrap();
        assert_eq!(
            api.endpoint_url("/auth/me"),
            "https://api.modelwatch.dev/api/v1/auth/me"
        );
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(ApiUrl::new("http://api.modelwatch.dev").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(ApiUrl::new("/api/v1/auth/me").is_err());
    }

    #[test]
    fn serde_round_trip() {
        let api = ApiUrl::new("https://api.modelwatch.dev").unwrap();
        let json = serde_json::to_string(&api).unwrap();
        let back: ApiUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(api, back);
    }
}
