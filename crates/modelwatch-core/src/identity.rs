//! User identity types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, InvalidInputError};

/// User roles for access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    DataScientist,
    MlEngineer,
    BusinessAnalyst,
    Viewer,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::DataScientist => "data_scientist",
            Role::MlEngineer => "ml_engineer",
            Role::BusinessAnalyst => "business_analyst",
            Role::Viewer => "viewer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Roles allowed to register and manage monitored models.
    pub fn can_manage_models(&self) -> bool {
        matches!(self, Role::Admin | Role::DataScientist | Role::MlEngineer)
    }

    /// Roles allowed to view model metrics.
    pub fn can_view_metrics(&self) -> bool {
        matches!(
            self,
            Role::Admin | Role::DataScientist | Role::MlEngineer | Role::BusinessAnalyst
        )
    }

    /// Roles allowed to generate compliance reports.
    pub fn can_generate_reports(&self) -> bool {
        matches!(self, Role::Admin | Role::DataScientist | Role::BusinessAnalyst)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "data_scientist" => Ok(Role::DataScientist),
            "ml_engineer" => Ok(Role::MlEngineer),
            "business_analyst" => Ok(Role::BusinessAnalyst),
            "viewer" => Ok(Role::Viewer),
            other => Err(InvalidInputError::Role {
                value: other.to_string(),
            }
            .into()),
        }
    }
}

/// Usage limits attached to a subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionLimits {
    /// Maximum monitored models; -1 means unlimited.
    pub max_models: i64,
    /// Maximum users in the organization; -1 means unlimited.
    pub max_users: i64,
    /// Metric retention window in days.
    pub retention_days: i64,
}

/// The authenticated user's profile record.
///
/// Owned by the session and replaced wholesale on login and restore; never
/// partially merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(default = "default_tier")]
    pub subscription_tier: String,
    #[serde(default = "default_subscription_status")]
    pub subscription_status: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_preferences")]
    pub preferences: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl Identity {
    /// Display name for the user: the full name when set, else the username.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }

    /// Usage limits for the user's subscription tier.
    ///
    /// Unknown tiers fall back to the starter limits.
    pub fn subscription_limits(&self) -> SubscriptionLimits {
        match self.subscription_tier.as_str() {
            "professional" => SubscriptionLimits {
                max_models: 100,
                max_users: 25,
                retention_days: 90,
            },
            "enterprise" => SubscriptionLimits {
                max_models: -1,
                max_users: -1,
                retention_days: 365,
            },
            _ => SubscriptionLimits {
                max_models: 10,
                max_users: 5,
                retention_days: 30,
            },
        }
    }
}

fn default_tier() -> String {
    "starter".to_string()
}

fn default_subscription_status() -> String {
    "active".to_string()
}

fn default_true() -> bool {
    true
}

fn default_preferences() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}
