//! Admin account management commands.

use anyhow::{Result, bail};
use atrio_core::api::types::{AdminCreate, AdminRole, AdminUpdate, Credentials, TwoFactorSettings};
use atrio_core::config::Config;
use atrio_core::session::SessionState;

use super::{admin_session, print_admin};

/// Signs in as an admin.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn login(config: &Config, email: &str, password: &str) -> Result<()> {
    let mut session = admin_session(config)?;
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };
    session.login(&credentials).await?;

    if let Some(admin) = session.state().principal() {
        println!("Signed in as {} ({})", admin.username, admin.role);
    }
    Ok(())
}

/// Signs out of the admin session.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn logout(config: &Config) -> Result<()> {
    let mut session = admin_session(config)?;
    session.logout().await?;
    println!("Signed out.");
    Ok(())
}

/// Shows the signed-in admin, restoring the session from disk first.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn whoami(config: &Config) -> Result<()> {
    let mut session = admin_session(config)?;
    session.hydrate().await;

    match session.state() {
        SessionState::Authenticated(admin) => {
            print_admin(admin);
            Ok(())
        }
        _ => bail!("Not signed in"),
    }
}

/// Lists all admin accounts, one per line.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn list(config: &Config) -> Result<()> {
    let session = admin_session(config)?;
    let token = session.require_token()?;
    let admins = session.api().list(&token).await?;

    if admins.is_empty() {
        println!("No admin accounts found.");
        return Ok(());
    }
    for admin in admins {
        let status = if admin.is_active { "active" } else { "inactive" };
        println!(
            "{}  {}  {}  {}  {}",
            admin.id, admin.role, admin.username, admin.email, status
        );
    }
    Ok(())
}

/// Shows one admin account by id.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn get(config: &Config, id: i64) -> Result<()> {
    let session = admin_session(config)?;
    let token = session.require_token()?;
    let admin = session.api().get(&token, id).await?;
    print_admin(&admin);
    Ok(())
}

/// Creates an admin account. Requires super admin privileges server-side.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn create(
    config: &Config,
    email: &str,
    username: &str,
    password: &str,
    role: AdminRole,
) -> Result<()> {
    let session = admin_session(config)?;
    let token = session.require_token()?;
    let payload = AdminCreate {
        email: email.to_string(),
        username: username.to_string(),
        password: password.to_string(),
        role,
    };
    let admin = session.api().create(&token, &payload).await?;

    println!("Created admin {}.", admin.id);
    print_admin(&admin);
    Ok(())
}

/// Applies a partial update to an admin account.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn update(
    config: &Config,
    id: i64,
    username: Option<String>,
    email: Option<String>,
    role: Option<AdminRole>,
    is_active: Option<bool>,
) -> Result<()> {
    let patch = AdminUpdate {
        username,
        email,
        role,
        is_active,
    };
    if patch.is_empty() {
        bail!("Nothing to update; pass at least one of --username, --email, --role, --activate, --deactivate");
    }

    let session = admin_session(config)?;
    let token = session.require_token()?;
    let admin = session.api().update(&token, id, &patch).await?;

    println!("Updated admin {id}.");
    print_admin(&admin);
    Ok(())
}

/// Deletes an admin account.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn delete(config: &Config, id: i64) -> Result<()> {
    let session = admin_session(config)?;
    let token = session.require_token()?;
    session.api().delete(&token, id).await?;
    println!("Deleted admin {id}.");
    Ok(())
}

/// Changes two-factor settings on a user account on their behalf.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn set_two_factor(config: &Config, user_id: i64, settings: TwoFactorSettings) -> Result<()> {
    let session = admin_session(config)?;
    let token = session.require_token()?;
    let ack = session
        .api()
        .update_user_two_factor(&token, user_id, &settings)
        .await?;
    println!("{}", ack.message);
    Ok(())
}
