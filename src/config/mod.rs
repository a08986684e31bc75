mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

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

    let default_paths = [
        "./config.toml",
        "./hlsforged.toml",
        "~/.config/hlsforged/config.toml",
        "/etc/hlsforged/config.toml",
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
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.jobs.expiration_secs == 0 {
        anyhow::bail!("jobs.expiration_secs must be greater than 0");
    }
    if config.jobs.reap_interval_secs == 0 {
        anyhow::bail!("jobs.reap_interval_secs must be greater than 0");
    }
    if config.remux.timeout_secs == 0 {
        anyhow::bail!("remux.timeout_secs must be greater than 0");
    }
    if config.fetch.request_timeout_secs == 0 {
        anyhow::bail!("fetch.request_timeout_secs must be greater than 0");
    }

    // Merge files are purged from download_dir on startup, so sharing it
    // with finished artifacts would delete them.
    if config.storage.download_dir == config.storage.converted_dir {
        anyhow::bail!(
            "storage.download_dir and storage.converted_dir must differ (both are {:?})",
            config.storage.download_dir
        );
    }

    if let Some(ref dir) = config.server.static_dir {
        if !dir.exists() {
            tracing::warn!("Static directory does not exist: {:?}", dir);
        }
    }

    Ok(())
}
