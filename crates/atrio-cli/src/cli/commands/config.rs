//! Config file commands.

use anyhow::{Context, Result};
use atrio_core::config::{Config, paths};

/// Prints the config file path.
pub fn path() {
    println!("{}", paths::config_path().display());
}

/// Creates a commented config file at the default location.
///
/// # Errors
/// Returns an error if the operation fails.
pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}
