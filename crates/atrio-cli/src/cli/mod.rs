//! CLI entry and dispatch.

use anyhow::{Context, Result};
use atrio_core::api::types::{AdminRole, TwoFactorSettings};
use atrio_core::config::Config;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "atrio")]
#[command(version)]
#[command(about = "Account and session client for an atrio backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Password source for commands that authenticate.
///
/// Passwords come from a flag or from a named environment variable; they are
/// used for the one call and never stored.
#[derive(clap::Args, Debug, Clone, Default)]
struct PasswordArgs {
    /// Password (prefer --password-env in scripts)
    #[arg(long)]
    password: Option<String>,

    /// Name of an environment variable holding the password
    #[arg(long, value_name = "VAR", conflicts_with = "password")]
    password_env: Option<String>,
}

impl PasswordArgs {
    /// Resolves the password from the flag or the named environment variable.
    fn resolve(&self) -> Result<String> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }
        if let Some(name) = &self.password_env {
            return std::env::var(name)
                .with_context(|| format!("read password from ${name}"));
        }
        anyhow::bail!("Provide --password or --password-env")
    }
}

/// Enable/disable pair shared by the two-factor commands.
#[derive(clap::Args, Debug, Clone, Default)]
struct TwoFactorArgs {
    /// Enable the second factor (requires --auth-profile)
    #[arg(long, conflicts_with = "disable")]
    enable: bool,

    /// Disable the second factor
    #[arg(long)]
    disable: bool,

    /// Auth profile id the second factor verifies against
    #[arg(long, value_name = "ID")]
    auth_profile: Option<i64>,
}

impl TwoFactorArgs {
    /// Turns the flag pair into wire settings.
    fn settings(&self) -> Result<TwoFactorSettings> {
        if self.enable == self.disable {
            anyhow::bail!("Specify exactly one of --enable or --disable");
        }
        if self.enable {
            let profile = self
                .auth_profile
                .context("--enable requires --auth-profile <ID>")?;
            Ok(TwoFactorSettings::enabled(profile))
        } else {
            Ok(TwoFactorSettings::disabled())
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Sign in
    Login {
        #[arg(long)]
        email: String,

        #[command(flatten)]
        password: PasswordArgs,

        /// Second factor, for accounts with two-factor auth enabled
        #[arg(long, value_name = "PASSWORD")]
        external_password: Option<String>,
    },

    /// Show the signed-in user
    Whoami,

    /// Sign out and clear the stored token
    Logout,

    /// Manage the signed-in user's profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Administer the backend (separate admin session)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Update username and/or email
    Update {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Configure two-factor authentication for the signed-in user
    TwoFactor {
        #[command(flatten)]
        args: TwoFactorArgs,
    },
}

#[derive(clap::Subcommand)]
enum AdminCommands {
    /// Sign in as an admin
    Login {
        #[arg(long)]
        email: String,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Sign out the admin session
    Logout,

    /// Show the signed-in admin
    Whoami,

    /// List admin accounts
    List,

    /// Show one admin account
    Get {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Create an admin account
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        #[command(flatten)]
        password: PasswordArgs,

        /// Role: admin or super_admin
        #[arg(long, default_value = "admin")]
        role: String,
    },

    /// Update an admin account
    Update {
        #[arg(value_name = "ID")]
        id: i64,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Role: admin or super_admin
        #[arg(long)]
        role: Option<String>,

        /// Activate the account
        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,

        /// Deactivate the account
        #[arg(long)]
        deactivate: bool,
    },

    /// Delete an admin account
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Configure two-factor authentication for a user account
    SetTwoFactor {
        #[arg(value_name = "USER_ID")]
        user_id: i64,

        #[command(flatten)]
        args: TwoFactorArgs,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Installs the stderr log subscriber. RUST_LOG overrides the default level.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;

    match cli.command {
        Commands::Register {
            email,
            username,
            password,
        } => {
            let password = password.resolve()?;
            commands::auth::register(&config, &email, &username, &password).await
        }

        Commands::Login {
            email,
            password,
            external_password,
        } => {
            let password = password.resolve()?;
            commands::auth::login(&config, &email, &password, external_password.as_deref()).await
        }

        Commands::Whoami => commands::auth::whoami(&config).await,
        Commands::Logout => commands::auth::logout(&config).await,

        Commands::Profile { command } => match command {
            ProfileCommands::Update { username, email } => {
                commands::profile::update(&config, username, email).await
            }
            ProfileCommands::TwoFactor { args } => {
                commands::profile::two_factor(&config, args.settings()?).await
            }
        },

        Commands::Admin { command } => match command {
            AdminCommands::Login { email, password } => {
                let password = password.resolve()?;
                commands::admin::login(&config, &email, &password).await
            }
            AdminCommands::Logout => commands::admin::logout(&config).await,
            AdminCommands::Whoami => commands::admin::whoami(&config).await,
            AdminCommands::List => commands::admin::list(&config).await,
            AdminCommands::Get { id } => commands::admin::get(&config, id).await,
            AdminCommands::Create {
                email,
                username,
                password,
                role,
            } => {
                let password = password.resolve()?;
                let role: AdminRole = role.parse().map_err(anyhow::Error::msg)?;
                commands::admin::create(&config, &email, &username, &password, role).await
            }
            AdminCommands::Update {
                id,
                username,
                email,
                role,
                activate,
                deactivate,
            } => {
                let role = match role.as_deref() {
                    Some(raw) => Some(raw.parse::<AdminRole>().map_err(anyhow::Error::msg)?),
                    None => None,
                };
                let is_active = match (activate, deactivate) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                commands::admin::update(&config, id, username, email, role, is_active).await
            }
            AdminCommands::Delete { id } => commands::admin::delete(&config, id).await,
            AdminCommands::SetTwoFactor { user_id, args } => {
                commands::admin::set_two_factor(&config, user_id, args.settings()?).await
            }
        },

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
