mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variables that override file settings, applied after parsing.
const ENV_OVERRIDES: &[&str] = &[
    "TMDB_API_KEY",
    "APPWRITE_ENDPOINT",
    "APPWRITE_PROJECT_ID",
    "APPWRITE_DATABASE_ID",
    "APPWRITE_COLLECTION_ID",
    "APPWRITE_API_KEY",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
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
        "./marquee.toml",
        "./config.toml",
        "~/.config/marquee/config.toml",
        "/etc/marquee/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Overlay credentials and backend identifiers from the process environment
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Overlay settings from an arbitrary lookup; empty values are ignored
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for key in ENV_OVERRIDES {
        let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        match *key {
            "TMDB_API_KEY" => config.tmdb.api_key = value,
            "APPWRITE_ENDPOINT" => config.tracker.endpoint = value,
            "APPWRITE_PROJECT_ID" => config.tracker.project_id = value,
            "APPWRITE_DATABASE_ID" => config.tracker.database_id = value,
            "APPWRITE_COLLECTION_ID" => config.tracker.collection_id = value,
            "APPWRITE_API_KEY" => config.tracker.api_key = Some(value),
            _ => {}
        }
        tracing::debug!("Config override applied from {}", key);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Validate server config
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if let Some(ref dir) = config.server.static_dir {
        if !dir.exists() {
            tracing::warn!("Static directory does not exist: {:?}", dir);
        }
    }

    // Validate search tuning
    if config.search.debounce_ms == 0 {
        anyhow::bail!("search.debounce_ms must be greater than 0");
    }
    if config.search.trending_limit == 0 {
        anyhow::bail!("search.trending_limit must be greater than 0");
    }

    // Validate TMDB client
    if config.tmdb.base_url.trim().is_empty() {
        anyhow::bail!("tmdb.base_url cannot be empty");
    }
    if config.tmdb.api_key.trim().is_empty() {
        tracing::warn!("TMDB API key is not set; searches will fail until TMDB_API_KEY is provided");
    }

    // Validate tracker backend
    if config.tracker.backend == TrackerBackend::Appwrite {
        let required = [
            ("tracker.endpoint", &config.tracker.endpoint),
            ("tracker.project_id", &config.tracker.project_id),
            ("tracker.database_id", &config.tracker.database_id),
            ("tracker.collection_id", &config.tracker.collection_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                anyhow::bail!("Appwrite tracker is selected but {} is empty", name);
            }
        }
    }

    Ok(())
}
