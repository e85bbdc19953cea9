//! User model with role-based access control.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Role claim carried in the session cookie and stored on user documents.
///
/// Ordered so that `member < admin < superAdmin`; route gates compare
/// against the level they require.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    #[default]
    Member,
    Admin,
    SuperAdmin,
}

impl UserRole {
    /// Parse the raw role claim string.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            "superAdmin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::SuperAdmin => "superAdmin",
        }
    }

    /// Whether this role clears the admin bar (admin or superAdmin).
    pub fn is_admin(self) -> bool {
        self >= Self::Admin
    }
}

/// User document. The id is the identity provider's uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub monthly_tokens: i64,
    #[serde(default)]
    pub total_tokens: i64,
    #[serde(default)]
    pub disabled: bool,
    pub created_at: bson::DateTime,
    #[serde(default)]
    pub last_active_at: Option<bson::DateTime>,
}

/// User response DTO with RFC 3339 timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub plan: String,
    pub monthly_tokens: i64,
    pub total_tokens: i64,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            role: u.role,
            plan: u.plan,
            monthly_tokens: u.monthly_tokens,
            total_tokens: u.total_tokens,
            disabled: u.disabled,
            created_at: u.created_at.to_chrono(),
            last_active_at: u.last_active_at.map(|t| t.to_chrono()),
        }
    }
}

/// Field patch applied by `POST /api/users/{id}/update`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub display_name: Option<String>,
    #[validate(length(min = 1, max = 40))]
    pub plan: Option<String>,
    pub role: Option<UserRole>,
    pub disabled: Option<bool>,
}

impl UpdateUserRequest {
    /// Whether the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.display_name.is_none()
            && self.plan.is_none()
            && self.role.is_none()
            && self.disabled.is_none()
    }
}

/// Per-user feature flag overrides, one document per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagOverride {
    #[serde(rename = "_id")]
    pub user_id: String,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    pub updated_by: String,
    pub updated_at: bson::DateTime,
}

/// Response DTO for flag overrides.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagOverrideResponse {
    pub user_id: String,
    pub flags: BTreeMap<String, bool>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl From<FeatureFlagOverride> for FeatureFlagOverrideResponse {
    fn from(o: FeatureFlagOverride) -> Self {
        Self {
            user_id: o.user_id,
            flags: o.flags,
            updated_by: o.updated_by,
            updated_at: o.updated_at.to_chrono(),
        }
    }
}

/// Body of `POST /api/users/{id}/feature-flags`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeatureFlagsRequest {
    #[validate(length(min = 1, max = 64))]
    pub flags: BTreeMap<String, bool>,
}
