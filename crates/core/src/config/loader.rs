use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "mtgcard.toml";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MTGCARD_CONFIG";

fn env_overrides() -> Env {
    Env::prefixed("MTGCARD_")
        .ignore(&["CONFIG"])
        .split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from `path`, or from [`CONFIG_ENV`] or
/// [`DEFAULT_CONFIG_FILE`] when no path is given.
///
/// An explicit path must exist. A missing default file falls back to the
/// built-in defaults plus environment overrides.
pub fn load_config_optional(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }

    let path = std::env::var_os(CONFIG_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
    if path.exists() {
        return load_config(&path);
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
