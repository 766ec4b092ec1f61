//! `statline.toml` loading.

use std::path::{Path, PathBuf};

use statline_query_models::StatlineConfig;

use crate::ConfigError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "STATLINE_CONFIG";

/// Used when neither a flag nor the environment names a file.
pub const DEFAULT_CONFIG_PATH: &str = "statline.toml";

/// Picks the configuration path: an explicit path wins, then
/// `STATLINE_CONFIG`, then `statline.toml` in the working directory.
#[must_use]
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    std::env::var(CONFIG_ENV_VAR).map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Reads and parses a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<StatlineConfig, ConfigError> {
    log::info!("Reading configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_config(&contents, base_dir)
}

/// Parses configuration text, resolving relative paths against
/// `base_dir`.
///
/// # Errors
///
/// Returns [`ConfigError::Toml`] if the text is not a valid configuration.
pub fn parse_config(toml_str: &str, base_dir: &Path) -> Result<StatlineConfig, ConfigError> {
    let mut config: StatlineConfig = toml::from_str(toml_str)?;

    let resolve = |path: &mut PathBuf| {
        if path.is_relative() {
            *path = base_dir.join(&*path);
        }
    };
    resolve(&mut config.regions);
    for path in [
        &mut config.population,
        &mut config.crime,
        &mut config.population_history,
    ]
    .into_iter()
    .flatten()
    {
        resolve(path);
    }

    Ok(config)
}
