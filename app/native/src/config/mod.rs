//! Configuration module for Backdrop.
//!
//! The configuration file is optional and supports JSONC format (JSON with
//! comments). Both single-line (`//`) and multi-line (`/* */`) comments are
//! allowed.

pub mod types;

use std::path::{Path, PathBuf};

pub use types::{
    BackdropConfig, ConfigError, config_paths, load_config as load_config_default,
    load_config_from_path, parse_hex_color,
};

/// Where the schema is published.
const SCHEMA_ID: &str =
    "https://raw.githubusercontent.com/backdrop-rs/backdrop/main/backdrop.schema.json";

/// A loaded configuration and the file it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// The parsed configuration, or the defaults when no file was found.
    pub config: BackdropConfig,
    /// The file that was read, if any.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory that relative image paths in the configuration resolve
    /// against.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> { self.path.as_deref().and_then(Path::parent) }
}

/// Loads the configuration.
///
/// An explicit `custom` path must exist. Without one, the default search
/// paths are tried and a missing file yields the default configuration.
///
/// # Errors
///
/// Returns an error if the chosen file could not be read or parsed, or if
/// `custom` does not exist.
pub fn load(custom: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = custom {
        let config = load_config_from_path(path)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        return Ok(LoadedConfig { config, path: Some(path.to_path_buf()) });
    }

    match load_config_default()? {
        Some((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(LoadedConfig { config, path: Some(path) })
        }
        None => {
            tracing::debug!("no configuration file found, using defaults");
            Ok(LoadedConfig::default())
        }
    }
}

/// Generates the JSON Schema of [`BackdropConfig`].
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(BackdropConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!(SCHEMA_ID));
    }

    schema
}

/// Generates the JSON Schema as a pretty-printed string.
#[must_use]
pub fn generate_schema_json() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}
