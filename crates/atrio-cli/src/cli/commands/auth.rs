//! Sign-in, sign-out, and registration commands.

use anyhow::{Result, bail};
use atrio_core::api::types::Credentials;
use atrio_core::config::Config;
use atrio_core::session::{LoginFlow, SessionState};

use super::{print_user, user_session};

/// Creates an account and signs in with the same credentials.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn register(config: &Config, email: &str, username: &str, password: &str) -> Result<()> {
    let mut session = user_session(config)?;

    match session.register(email, username, password).await? {
        LoginFlow::Completed => println!("Account created; signed in as {username}."),
        LoginFlow::TwoFactorRequired => {
            println!("Account created; two-factor authentication is required to sign in.");
            println!("Run `atrio login --external-password <CODE>` to complete sign-in.");
        }
    }
    Ok(())
}

/// Signs in, completing the second factor in the same invocation when the
/// external password was provided up front.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn login(
    config: &Config,
    email: &str,
    password: &str,
    external_password: Option<&str>,
) -> Result<()> {
    let mut session = user_session(config)?;
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };

    if session.login(&credentials).await? == LoginFlow::TwoFactorRequired {
        let Some(external_password) = external_password else {
            bail!("Two-factor authentication required; re-run with --external-password");
        };
        session.verify_two_factor(external_password).await?;
    }

    if let Some(user) = session.state().principal() {
        println!("Signed in as {} <{}>", user.username, user.email);
    }
    Ok(())
}

/// Shows the signed-in account, restoring the session from disk first.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn whoami(config: &Config) -> Result<()> {
    let mut session = user_session(config)?;
    session.hydrate().await;

    match session.state() {
        SessionState::Authenticated(user) => {
            print_user(user);
            Ok(())
        }
        _ => bail!("Not signed in"),
    }
}

/// Signs out and discards the stored token.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn logout(config: &Config) -> Result<()> {
    let mut session = user_session(config)?;
    session.logout().await?;
    println!("Signed out.");
    Ok(())
}
