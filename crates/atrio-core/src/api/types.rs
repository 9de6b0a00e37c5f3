//! Wire types for the account backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};

/// A user account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    /// Backend-formatted timestamp, kept opaque.
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_factor_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_profile_id: Option<i64>,
}

/// An admin account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: AdminRole,
    pub is_active: bool,
    /// Backend-formatted timestamp, kept opaque.
    pub created_at: String,
}

/// Admin privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AdminRole {
    /// Returns the wire identifier for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(AdminRole::Admin),
            "super_admin" | "super-admin" => Ok(AdminRole::SuperAdmin),
            _ => Err(format!("Unknown admin role: {value}")),
        }
    }
}

/// Login credentials. Held only for the duration of the call.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Payload for creating a user account.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Bearer token issued on successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

/// Bearer token plus role echo issued on successful admin login.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminToken {
    pub access_token: String,
    pub token_type: String,
    pub role: AdminRole,
}

/// Raw response shape of the user login endpoint.
///
/// Which fields are populated depends on `requires_2fa`; use
/// [`LoginResponse::into_outcome`] to get the normalized form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub requires_2fa: bool,
    #[serde(default)]
    pub temp_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Normalized outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Fully authenticated; the token is ready to persist.
    Authenticated(Token),
    /// A second factor is required; the temp token redeems it.
    TwoFactorRequired { temp_token: String },
}

impl LoginResponse {
    /// Normalizes the raw login response into a tagged outcome.
    ///
    /// # Errors
    /// Returns a protocol error when the response omits the field its own
    /// `requires_2fa` flag promises.
    pub fn into_outcome(self) -> ApiResult<LoginOutcome> {
        if self.requires_2fa {
            let temp_token = self.temp_token.filter(|t| !t.is_empty()).ok_or_else(|| {
                ApiError::protocol("Login response signaled a second factor but carried no temp token")
            })?;
            return Ok(LoginOutcome::TwoFactorRequired { temp_token });
        }

        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::protocol("Login response carried no access token"))?;
        Ok(LoginOutcome::Authenticated(Token {
            access_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
        }))
    }
}

/// Patch for the caller's own profile; unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileUpdate {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

/// Payload for creating an admin account.
#[derive(Debug, Clone, Serialize)]
pub struct AdminCreate {
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: AdminRole,
}

/// Patch for an admin account; unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl AdminUpdate {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

/// Two-factor configuration for an account.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TwoFactorSettings {
    pub enable_2fa: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_profile_id: Option<i64>,
}

impl TwoFactorSettings {
    /// Enables the second factor against an auth profile.
    pub fn enabled(auth_profile_id: i64) -> Self {
        Self {
            enable_2fa: true,
            auth_profile_id: Some(auth_profile_id),
        }
    }

    /// Disables the second factor.
    pub fn disabled() -> Self {
        Self {
            enable_2fa: false,
            auth_profile_id: None,
        }
    }
}

/// Acknowledgement returned by the two-factor settings endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TwoFactorAck {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub enable_2fa: bool,
    #[serde(default)]
    pub auth_profile_id: Option<i64>,
}
