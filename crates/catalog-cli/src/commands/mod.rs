//! CLI command implementations.

mod auth;
mod config;
mod request;

pub use auth::{login, logout, refresh, register, status};
pub use config::{configure, ConfigUpdate};
pub use request::request;

use anyhow::Result;
use std::io::{self, Write};

/// Read a line from stdin after printing `label`.
fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Read a password without echo. Empty input is rejected.
fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
