//! Authentication commands.

use super::{prompt, prompt_password};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_gateway::{AuthGateway, LoginRequest, RegisterRequest, SessionSnapshot};

/// Login with username and password.
pub async fn login(
    gateway: &AuthGateway,
    username: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let session = gateway.session();
    if session.is_authenticated() {
        let user = session.current_user().unwrap_or_else(|| "unknown".to_string());
        output::print_success(&format!("Already logged in as {}", user), format);
        return Ok(());
    }

    let username = match username {
        Some(username) => username,
        None => prompt("Username")?,
    };
    if username.is_empty() {
        anyhow::bail!("Username is required");
    }
    let password = prompt_password()?;

    let response = gateway.login(&LoginRequest { username, password }).await?;
    output::print_success(&format!("Logged in as {}", response.username), format);
    Ok(())
}

/// Create an account and sign in with it.
pub async fn register(
    gateway: &AuthGateway,
    username: String,
    email: String,
    name: String,
    format: &OutputFormat,
) -> Result<()> {
    let password = prompt_password()?;
    let account = RegisterRequest {
        username,
        email,
        password,
        name,
    };

    let response = gateway.register(&account).await?;
    output::print_success(
        &format!("Registered and logged in as {}", response.username),
        format,
    );
    Ok(())
}

/// Logout and clear the stored session.
pub fn logout(gateway: &AuthGateway, format: &OutputFormat) -> Result<()> {
    gateway.logout();
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Exchange the refresh token for a new pair.
pub async fn refresh(gateway: &AuthGateway, format: &OutputFormat) -> Result<()> {
    gateway.refresh_session().await?;
    let snapshot = gateway.session().snapshot();
    output::print_success(
        &format!("Session refreshed, expires {}", expiry_label(&snapshot)),
        format,
    );
    Ok(())
}

/// Show the local authentication state.
pub fn status(gateway: &AuthGateway, format: &OutputFormat) -> Result<()> {
    let snapshot = gateway.session().snapshot();

    match format {
        OutputFormat::Text => {
            output::print_row("API", gateway.base_url());
            if snapshot.authenticated {
                output::print_row("Auth", "logged in");
            } else {
                output::print_row("Auth", "not logged in");
            }
            if let Some(username) = &snapshot.username {
                output::print_row("User", username);
            }
            output::print_row("Expires", &expiry_label(&snapshot));
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "api_url": gateway.base_url(),
                "logged_in": snapshot.authenticated,
                "username": snapshot.username,
                "expires_at": snapshot.expires_at.map(|at| at.to_rfc3339()),
            });
            output::print_json(&json, format);
        }
    }

    Ok(())
}

fn expiry_label(snapshot: &SessionSnapshot) -> String {
    snapshot
        .expires_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}
