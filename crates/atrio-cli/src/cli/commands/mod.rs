//! CLI command handlers.

pub mod admin;
pub mod auth;
pub mod config;
pub mod profile;

use anyhow::Result;
use atrio_core::api::types::{AdminAccount, UserAccount};
use atrio_core::api::{AdminApi, ApiConfig, UserApi};
use atrio_core::config::Config;
use atrio_core::session::{AdminSession, UserSession};
use atrio_core::store::{SessionKind, TokenStore};
use tracing::debug;

/// Builds a user session against the configured backend.
pub(crate) fn user_session(config: &Config) -> Result<UserSession> {
    let api_config = ApiConfig::from_config(config)?;
    debug!("using backend at {}", api_config.base_url);
    let api = UserApi::new(&api_config)?;
    Ok(UserSession::new(api, TokenStore::open(SessionKind::User)))
}

/// Builds an admin session against the configured backend.
pub(crate) fn admin_session(config: &Config) -> Result<AdminSession> {
    let api_config = ApiConfig::from_config(config)?;
    debug!("using backend at {}", api_config.base_url);
    let api = AdminApi::new(&api_config)?;
    Ok(AdminSession::new(api, TokenStore::open(SessionKind::Admin)))
}

pub(crate) fn print_user(user: &UserAccount) {
    println!("id:        {}", user.id);
    println!("email:     {}", user.email);
    println!("username:  {}", user.username);
    println!("active:    {}", if user.is_active { "yes" } else { "no" });
    println!("created:   {}", format_timestamp(&user.created_at));
    if let Some(enabled) = user.two_factor_enabled {
        let status = if enabled { "enabled" } else { "disabled" };
        println!("2fa:       {status}");
    }
}

pub(crate) fn print_admin(admin: &AdminAccount) {
    println!("id:        {}", admin.id);
    println!("email:     {}", admin.email);
    println!("username:  {}", admin.username);
    println!("role:      {}", admin.role);
    println!("active:    {}", if admin.is_active { "yes" } else { "no" });
    println!("created:   {}", format_timestamp(&admin.created_at));
}

/// Pretty-prints a backend timestamp, falling back to the raw value.
pub(crate) fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    // Timestamps without an offset arrive as naive ISO-8601.
    if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}
