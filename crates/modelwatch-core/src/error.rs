//! Error types for the modelwatch client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, validation, authorization, server, and storage failures.

use std::fmt;
use thiserror::Error;

/// The unified error type for modelwatch operations.
///
/// This error type covers all possible failure modes in the client,
/// with explicit variants to allow callers to handle specific cases.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// 4xx responses carrying a server-side detail message.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// 401-class responses. Handled globally by the session manager
    /// (forced logout plus policy hook), not a per-call rejection.
    #[error("authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// 5xx responses.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// Login failures surfaced to the caller.
    #[error("authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Registration failures surfaced to the caller.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Token store failures. A failed write is a hard failure of the
    /// operation that triggered it.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (invalid API URL, unknown role).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Human-readable message for display to the user.
    ///
    /// Returns the server-supplied detail where one exists, falling back
    /// to a generic message per failure class.
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport(_) => {
                "Network error. Check your connection and try again.".to_string()
            }
            Error::Validation(err) => err
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| "The request was rejected.".to_string()),
            Error::Authorization(_) => "Your session has expired. Log in again.".to_string(),
            Error::Server(err) => err
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| "The server reported an error. Try again later.".to_string()),
            Error::Authentication(err) => err.message().to_string(),
            Error::Registration(err) => err.message().to_string(),
            Error::Storage(err) => err.to_string(),
            Error::InvalidInput(err) => err.to_string(),
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A 4xx response carrying a server-side validation detail.
#[derive(Debug)]
pub struct ValidationError {
    status: u16,
    detail: Option<String>,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    /// HTTP status code of the rejected request.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Detail message extracted from the response body, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A 401-class response, or a missing credential for an operation that
/// requires one.
#[derive(Debug)]
pub struct AuthorizationError {
    status: Option<u16>,
    detail: Option<String>,
}

impl AuthorizationError {
    /// Create a new authorization error from a response.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self {
            status: Some(status),
            detail,
        }
    }

    /// The operation required a bearer credential and none was held.
    pub fn missing_credential() -> Self {
        Self {
            status: None,
            detail: Some("no active session".to_string()),
        }
    }

    /// HTTP status code, absent when no request was made.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Detail message extracted from the response body, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "authorization required")?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for AuthorizationError {}

/// A 5xx response.
#[derive(Debug)]
pub struct ServerError {
    status: u16,
    detail: Option<String>,
}

impl ServerError {
    /// Create a new server error.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Detail message extracted from the response body, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServerError {}

/// A failed login attempt.
///
/// Carries the human-readable reason shown to the user. Transport and
/// server failures during login are folded into this type so the session
/// always lands in a well-defined state with a displayable message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthenticationError {
    message: String,
    superseded: bool,
}

impl AuthenticationError {
    /// Create a new authentication error with the given reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            superseded: false,
        }
    }

    /// The attempt was superseded by a newer login before it resolved.
    /// Its result was discarded and the session state is untouched.
    pub fn superseded() -> Self {
        Self {
            message: "login superseded by a newer attempt".to_string(),
            superseded: true,
        }
    }

    /// The reason shown to the user.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if this attempt lost to a more recently issued one.
    pub fn is_superseded(&self) -> bool {
        self.superseded
    }
}

/// A failed registration attempt.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RegistrationError {
    message: String,
}

impl RegistrationError {
    /// Create a new registration error with the given reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The reason shown to the user.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Token store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading the persisted token failed.
    #[error("failed to read token: {message}")]
    Read { message: String },

    /// Writing the token failed.
    #[error("failed to write token: {message}")]
    Write { message: String },

    /// Deleting the token failed.
    #[error("failed to delete token: {message}")]
    Delete { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Unknown role name.
    #[error("unknown role '{value}'")]
    Role { value: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_detail_is_surfaced() {
        let err = Error::Validation(ValidationError::new(
            400,
            Some("Incorrect current password".to_string()),
        ));
        assert_eq!(err.user_message(), "Incorrect current password");
    }

    #[test]
    fn validation_without_detail_falls_back() {
        let err = Error::Validation(ValidationError::new(422, None));
        assert_eq!(err.user_message(), "The request was rejected.");
    }

    #[test]
    fn transport_message_is_generic() {
        let err = Error::Transport(TransportError::Timeout);
        assert!(err.user_message().contains("Network error"));
    }

    #[test]
    fn superseded_attempt_is_flagged() {
        let err = AuthenticationError::superseded();
        assert!(err.is_superseded());
        assert!(!AuthenticationError::new("bad password").is_superseded());
    }

    #[test]
    fn authorization_display_includes_status() {
        let err = AuthorizationError::new(401, Some("Could not validate credentials".to_string()));
        let rendered = err.to_string();
        assert!(rendered.contains("401"));
        assert!(rendered.contains("Could not validate credentials"));
    }
}
