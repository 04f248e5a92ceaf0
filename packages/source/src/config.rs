//! Locating and parsing the TOML configuration file.

use std::path::{Path, PathBuf};

use site_map_source_models::SiteMapConfig;

use crate::SourceError;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "SITE_MAP_CONFIG";

/// Config file looked up in the working directory as a last resort.
pub const DEFAULT_CONFIG_FILE: &str = "site_map.toml";

/// Picks the config file path: `explicit`, then `$SITE_MAP_CONFIG`, then
/// [`DEFAULT_CONFIG_FILE`].
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(
        || {
            std::env::var_os(CONFIG_ENV_VAR)
                .filter(|value| !value.is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
        },
        Path::to_path_buf,
    )
}

/// Reads and parses a config file. Relative paths inside it are resolved
/// against the file's directory.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read or
/// [`SourceError::Toml`] if it does not parse.
pub fn load_config(path: &Path) -> Result<SiteMapConfig, SourceError> {
    let contents = crate::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let config = parse_config(&contents, base).map_err(|message| SourceError::Toml {
        path: path.display().to_string(),
        message,
    })?;

    log::info!("Loaded config from {}", path.display());

    Ok(config)
}

/// Parses config text, resolving relative paths against `base`.
///
/// # Errors
///
/// Returns the parser's message if the text is not a valid config.
pub fn parse_config(contents: &str, base: &Path) -> Result<SiteMapConfig, String> {
    let config: SiteMapConfig = toml::de::from_str(contents).map_err(|e| e.to_string())?;

    if !(config.analysis.match_tolerance_deg.is_finite()
        && config.analysis.match_tolerance_deg >= 0.0)
    {
        return Err(format!(
            "analysis.match_tolerance_deg must be a non-negative number, got {}",
            config.analysis.match_tolerance_deg
        ));
    }

    Ok(config.resolve_paths(base))
}
