//! Catalog admin CLI - authenticated access to the catalog backend.

mod commands;
mod output;

use anyhow::Result;
use auth_gateway::{AuthError, AuthGateway, SessionEvent, SessionManager};
use catalog_config_and_utils::{init_logging_for_service, parse_level, Config, Paths};
use catalog_storage::create_session_store;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::debug;

/// Catalog admin CLI - Sign in and call the catalog API.
#[derive(Parser)]
#[command(name = "catalog-admin")]
#[command(about = "Catalog admin CLI for authentication and API access")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// API base URL, e.g. http://localhost:8080/api/v1
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with username and password
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
    },

    /// Logout and clear session
    Logout,

    /// Check authentication status
    Status,

    /// Exchange the refresh token for a new token pair
    Refresh,

    /// Save --api-url, --log-level and the request timeout to config.json
    Configure {
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Send an authenticated request to the API
    Request {
        /// HTTP method
        method: String,
        /// Path relative to the API base URL
        path: String,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },
}

/// Reject a `--log-level` that tracing does not know.
fn validate_log_level(level: &str) -> Result<()> {
    if parse_level(level).is_none() {
        anyhow::bail!(
            "Unknown log level '{}' (expected trace, debug, info, warn or error)",
            level
        );
    }
    Ok(())
}

fn load_config(cli: &Cli, paths: &Paths) -> Result<Config> {
    let mut config = Config::load(paths)?;
    if let Some(level) = &cli.log_level {
        validate_log_level(level)?;
        config.log_level = level.clone();
    }
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    Ok(config)
}

async fn run(cli: &Cli) -> Result<()> {
    let paths = Paths::new()?;
    paths.ensure_dirs()?;
    let config = load_config(cli, &paths)?;

    init_logging_for_service("catalog-admin", &config.log_level, Some(paths.log_file()));
    debug!(api_url = %config.api_url, "Configuration loaded");

    let session = Arc::new(SessionManager::new(create_session_store(
        &paths.session_file(),
    )));
    if !matches!(cli.command, Commands::Logout) {
        session.subscribe(Box::new(|event| {
            if *event == SessionEvent::SignedOut {
                eprintln!("Session ended. Run 'catalog-admin login' to sign in again.");
            }
        }));
    }
    let gateway = AuthGateway::from_config(&config, session)?;

    let format = &cli.format;
    match &cli.command {
        Commands::Login { username } => {
            commands::login(&gateway, username.clone(), format).await
        }
        Commands::Register {
            username,
            email,
            name,
        } => {
            commands::register(&gateway, username.clone(), email.clone(), name.clone(), format)
                .await
        }
        Commands::Logout => commands::logout(&gateway, format),
        Commands::Status => commands::status(&gateway, format),
        Commands::Refresh => commands::refresh(&gateway, format).await,
        Commands::Configure { timeout_secs } => {
            let update = commands::ConfigUpdate {
                api_url: cli.api_url.clone(),
                log_level: cli.log_level.clone(),
                timeout_secs: *timeout_secs,
            };
            commands::configure(&paths, update, format)
        }
        Commands::Request { method, path, data } => {
            commands::request(&gateway, method, path, data.as_deref(), format).await
        }
    }
}

/// Message shown for a failed command. Gateway errors use their friendly text.
fn error_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<AuthError>() {
        Some(auth) => auth.user_message(),
        None => format!("{:#}", error),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        output::print_error(&error_message(&e), &cli.format);
        std::process::exit(1);
    }
}
