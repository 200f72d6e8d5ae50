//! Persisted client configuration.

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use catalog_config_and_utils::{Config, Paths};

/// Settings to write into `config.json`. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub api_url: Option<String>,
    pub log_level: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Write the given settings to the config file and show the result.
///
/// Environment overrides are not persisted; only the file and the explicit
/// flags are merged.
pub fn configure(paths: &Paths, update: ConfigUpdate, format: &OutputFormat) -> Result<()> {
    let config = apply_update(paths, update)?;

    match format {
        OutputFormat::Text => {
            output::print_row("Config", &paths.config_file().display().to_string());
            output::print_row("API", &config.api_url);
            output::print_row("Log level", &config.log_level);
            output::print_row("Timeout", &format!("{}s", config.request_timeout_secs));
        }
        OutputFormat::Json => output::print_json(&config, format),
    }
    Ok(())
}

fn apply_update(paths: &Paths, update: ConfigUpdate) -> Result<Config> {
    let config_file = paths.config_file();
    let mut config = if config_file.exists() {
        Config::load_from_file(&config_file)
            .with_context(|| format!("reading {}", config_file.display()))?
    } else {
        Config::default()
    };

    if let Some(api_url) = update.api_url {
        config.api_url = api_url;
    }
    if let Some(log_level) = update.log_level {
        config.log_level = log_level;
    }
    if let Some(timeout_secs) = update.timeout_secs {
        config.request_timeout_secs = timeout_secs;
    }

    config.api_url()?;
    config.save(paths)?;
    Ok(config)
}
