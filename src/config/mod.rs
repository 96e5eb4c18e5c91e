mod types;

pub use types::*;

use std::path::Path;

use anyhow::{Context, Result};

use crate::reference::Source;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./boxart.toml",
        "~/.config/boxart/config.toml",
        "/etc/boxart/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.wikimedia.endpoint.trim().is_empty() {
        anyhow::bail!("wikimedia.endpoint cannot be empty");
    }
    if config.wikimedia.timeout_secs == 0 {
        anyhow::bail!("wikimedia.timeout_secs cannot be 0");
    }
    if config.cache.ttl_days == Some(0) {
        anyhow::bail!("cache.ttl_days cannot be 0; omit it to disable expiry");
    }
    if matches!(
        config.resolver.default_source,
        Source::Auto | Source::Cache
    ) {
        anyhow::bail!("resolver.default_source must name a concrete provider");
    }

    if let Some(path) = &config.cache.path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tracing::warn!("Cache directory does not exist yet: {:?}", parent);
            }
        }
    }

    Ok(())
}
