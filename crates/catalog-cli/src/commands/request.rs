//! Raw authenticated requests against the catalog API.

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use auth_gateway::{ApiRequest, AuthGateway, Method};
use tracing::debug;

/// Send `METHOD PATH` through the gateway and print the response body.
pub async fn request(
    gateway: &AuthGateway,
    method: &str,
    path: &str,
    data: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let method = parse_method(method)?;
    let mut request = ApiRequest::new(method, gateway.url(path));
    if let Some(data) = data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("--data must be valid JSON")?;
        request = request.json(&body)?;
    }

    debug!(method = %request.method, url = %request.url, "Sending request");
    let response = gateway.send(request).await?;

    match response.json::<serde_json::Value>() {
        Ok(body) => output::print_json(&body, format),
        Err(_) if response.body.is_empty() => {
            output::print_success(&format!("{}", response.status), format)
        }
        Err(_) => println!("{}", response.text()),
    }
    Ok(())
}

pub(crate) fn parse_method(raw: &str) -> Result<Method> {
    let upper = raw.to_ascii_uppercase();
    match upper.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" | "OPTIONS" => {
            Ok(Method::from_bytes(upper.as_bytes())?)
        }
        _ => anyhow::bail!("Unsupported HTTP method: {}", raw),
    }
}
