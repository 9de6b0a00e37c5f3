//! Account profile commands.

use anyhow::{Result, bail};
use atrio_core::api::types::{ProfileUpdate, TwoFactorSettings};
use atrio_core::config::Config;

use super::{print_user, user_session};

/// Updates the signed-in account's username and/or email.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn update(config: &Config, username: Option<String>, email: Option<String>) -> Result<()> {
    let patch = ProfileUpdate { username, email };
    if patch.is_empty() {
        bail!("Nothing to update; pass --username and/or --email");
    }

    let mut session = user_session(config)?;
    let user = session.update_profile(&patch).await?;

    println!("Profile updated.");
    print_user(&user);
    Ok(())
}

/// Enables or disables two-factor authentication for the signed-in account.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn two_factor(config: &Config, settings: TwoFactorSettings) -> Result<()> {
    let mut session = user_session(config)?;
    let ack = session.update_two_factor(&settings).await?;
    println!("{}", ack.message);
    Ok(())
}
