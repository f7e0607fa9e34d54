//! Endpoint definitions and request/response types.

use serde::{Deserialize, Serialize};

use modelwatch_core::{Identity, Role};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// POST: authenticate with email and password.
pub(crate) const AUTH_LOGIN_EMAIL: &str = "/auth/login/email";

/// POST: create a new account.
pub(crate) const AUTH_REGISTER: &str = "/auth/register";

/// GET: fetch the identity behind the bearer credential.
pub(crate) const AUTH_ME: &str = "/auth/me";

/// POST: rotate the bearer credential.
pub(crate) const AUTH_REFRESH: &str = "/auth/refresh";

/// POST: best-effort logout notification.
pub(crate) const AUTH_LOGOUT: &str = "/auth/logout";

/// POST: change the account password.
pub(crate) const AUTH_CHANGE_PASSWORD: &str = "/auth/change-password";

/// POST: request a password reset email.
pub(crate) const AUTH_RESET_PASSWORD: &str = "/auth/reset-password";

/// POST: confirm a password reset with the emailed token.
pub(crate) const AUTH_RESET_PASSWORD_CONFIRM: &str = "/auth/reset-password/confirm";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the email login endpoint.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from the login endpoint. The token and identity come from the
/// same transaction, which is what lets the session manager apply them
/// atomically.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    #[allow(dead_code)]
    pub token_type: String,
    pub user: Identity,
}

/// Request body for the register endpoint.
#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Response from the refresh endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[allow(dead_code)]
    pub token_type: String,
}

/// Request body for the change-password endpoint.
#[derive(Serialize)]
pub(crate) struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// Request body for the reset-password endpoint.
#[derive(Serialize)]
pub(crate) struct ResetPasswordRequest<'a> {
    pub email: &'a str,
}

/// Request body for the reset-password confirmation endpoint.
#[derive(Serialize)]
pub(crate) struct ResetPasswordConfirmRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

/// Message-only response used by the password endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageResponse {
    pub message: String,
}

/// Error response body.
///
/// The server reports errors as `{"detail": ...}` where detail is either a
/// plain string or a list of per-field validation entries.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Extract a single human-readable message from the detail field.
    pub(crate) fn detail_message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(entries) => entries.iter().find_map(|entry| {
                entry
                    .get("msg")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            }),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_detail_is_extracted() {
        let body: ApiErrorBody =
            serde_json::from_value(json!({"detail": "Incorrect email or password"})).unwrap();
        assert_eq!(
            body.detail_message().as_deref(),
            Some("Incorrect email or password")
        );
    }

    #[test]
    fn field_validation_detail_uses_first_msg() {
        let body: ApiErrorBody = serde_json::from_value(json!({
            "detail": [
                {"loc": ["body", "password"], "msg": "Password must be at least 8 characters long"},
                {"loc": ["body", "email"], "msg": "value is not a valid email address"}
            ]
        }))
        .unwrap();
        assert_eq!(
            body.detail_message().as_deref(),
            Some("Password must be at least 8 characters long")
        );
    }

    #[test]
    fn missing_detail_yields_none() {
        let body: ApiErrorBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.detail_message(), None);
    }
}
