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
        "./nalmux.toml",
        "~/.config/nalmux/config.toml",
        "/etc/nalmux/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.mux.fps <= 0 {
        anyhow::bail!("mux.fps must be positive, got {}", config.mux.fps);
    }

    if config.mux.width == Some(0) || config.mux.height == Some(0) {
        anyhow::bail!("mux.width and mux.height cannot be 0");
    }

    let brands = std::iter::once(&config.mp4.major_brand).chain(&config.mp4.compatible_brands);
    for brand in brands {
        if brand.len() != 4 {
            anyhow::bail!("MP4 brand must be exactly four bytes: {:?}", brand);
        }
    }

    if config.mp4.language.len() != 3 {
        tracing::warn!(
            "mp4.language {:?} is not a three-letter ISO 639-2 code",
            config.mp4.language
        );
    }

    Ok(())
}
