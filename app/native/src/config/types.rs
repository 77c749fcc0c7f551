//! Configuration types for Backdrop.
//!
//! These types are deserialized from the user's JSONC configuration file and
//! drive the JSON Schema printed by `backdrop --print-schema`.

use std::fs;
use std::path::{Path, PathBuf};

use image::Rgba;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::APP_NAME;
use crate::wallpaper::{PlacementMode, ResizeFilter, RotatePolicy};

/// Root configuration for Backdrop.
///
/// Every key is optional. Command line flags take precedence over the values
/// read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BackdropConfig {
    /// Image files or directories, used when none are given on the command
    /// line. Relative paths are resolved against the configuration file's
    /// directory; `~` expands to the home directory.
    pub images: Vec<String>,

    /// How each image is fitted to its monitor.
    pub mode: PlacementMode,

    /// Whether images are rotated to match monitor orientation.
    pub rotate: RotatePolicy,

    /// Colour of uncovered screen areas, as `#rrggbb` or `#rrggbbaa`.
    pub background: String,

    /// Resampling filter used when an image changes size.
    pub filter: ResizeFilter,

    /// Keep running and redraw whenever the screen geometry changes.
    pub resident: bool,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            mode: PlacementMode::default(),
            rotate: RotatePolicy::default(),
            background: "#000000".to_string(),
            filter: ResizeFilter::default(),
            resident: false,
        }
    }
}

/// Errors that can occur when loading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested configuration file does not exist.
    NotFound(PathBuf),
    /// The configuration file exists but could not be read.
    IoError(std::io::Error),
    /// The configuration file contains invalid JSON.
    ParseError(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "No configuration file found at {}", path.display())
            }
            Self::IoError(err) => write!(f, "Failed to read configuration file: {err}"),
            Self::ParseError(err) => write!(f, "Failed to parse configuration file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            Self::ParseError(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err) }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self { Self::ParseError(err) }
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Dotfile names in the home directory.
const HOME_CONFIG_FILE_NAMES: &[&str] = &[".backdrop.jsonc", ".backdrop.json"];

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/backdrop/config.jsonc` or `config.json`
/// 2. `~/.config/backdrop/config.jsonc` or `config.json`
/// 3. The platform configuration directory, when it differs from the above
/// 4. `~/.backdrop.jsonc` or `~/.backdrop.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut push_dir = |dir: PathBuf| {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    };

    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
        push_dir(PathBuf::from(xdg_config).join(APP_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        push_dir(home.join(".config").join(APP_NAME));
    }
    if let Some(config_dir) = dirs::config_dir() {
        push_dir(config_dir.join(APP_NAME));
    }

    if let Some(home) = dirs::home_dir() {
        for filename in HOME_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Loads the configuration from a specific file.
///
/// Both single-line (`//`) and multi-line (`/* */`) comments are stripped
/// before parsing.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist.
/// Returns `ConfigError::IoError` if the file could not be read.
/// Returns `ConfigError::ParseError` if the file contains invalid JSON.
pub fn load_config_from_path(path: &Path) -> Result<BackdropConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Loads the configuration from the first existing file in [`config_paths`].
///
/// Returns `Ok(None)` when none of them exists.
///
/// # Errors
///
/// Returns an error if a configuration file was found but could not be read
/// or parsed.
pub fn load_config() -> Result<Option<(BackdropConfig, PathBuf)>, ConfigError> {
    config_paths()
        .into_iter()
        .find(|path| path.exists())
        .map(|path| load_config_from_path(&path).map(|config| (config, path)))
        .transpose()
}

/// Parses a `#rrggbb` or `#rrggbbaa` colour. The leading `#` is optional.
///
/// # Errors
///
/// Returns a description of the problem if `value` is not a hex colour.
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>, String> {
    let hex = value.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);

    if !hex.is_ascii() || !matches!(hex.len(), 6 | 8) {
        return Err(format!("invalid colour '{value}': expected #rrggbb or #rrggbbaa"));
    }

    let channel = |index: usize| {
        u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16)
            .map_err(|_| format!("invalid colour '{value}': not a hex number"))
    };

    let alpha = if hex.len() == 8 { channel(3)? } else { u8::MAX };
    Ok(Rgba([channel(0)?, channel(1)?, channel(2)?, alpha]))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = BackdropConfig::default();
        assert!(config.images.is_empty());
        assert_eq!(config.mode, PlacementMode::Scale);
        assert_eq!(config.rotate, RotatePolicy::Auto);
        assert_eq!(config.background, "#000000");
        assert!(!config.resident);
    }

    #[test]
    fn test_config_deserializes_partial_object() {
        let json = r#"{ "mode": "center", "resident": true }"#;

        let config: BackdropConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, PlacementMode::Center);
        assert!(config.resident);
        assert_eq!(config.filter, ResizeFilter::CatmullRom);
    }

    #[test]
    fn test_config_deserializes_every_key() {
        let json = r##"{
            "images": ["~/walls", "left.png"],
            "mode": "stretch",
            "rotate": "never",
            "background": "#102030",
            "filter": "lanczos3",
            "resident": false
        }"##;

        let config: BackdropConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.images, vec!["~/walls", "left.png"]);
        assert_eq!(config.mode, PlacementMode::Stretch);
        assert_eq!(config.rotate, RotatePolicy::Never);
        assert_eq!(config.background, "#102030");
        assert_eq!(config.filter, ResizeFilter::Lanczos3);
    }

    #[test]
    fn test_unknown_mode_is_a_parse_error() {
        let result: Result<BackdropConfig, _> = serde_json::from_str(r#"{ "mode": "tile" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_path_strips_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                // fit every image
                "mode": "scale",
                /* keep watching */
                "resident": true
            }}"#
        )
        .unwrap();

        let config = load_config_from_path(file.path()).unwrap();
        assert!(config.resident);
    }

    #[test]
    fn test_load_config_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.jsonc");

        let err = load_config_from_path(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(err.to_string().contains("nope.jsonc"));
    }

    #[test]
    fn test_load_config_from_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"mode\": ").unwrap();

        let err = load_config_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_config_paths_end_with_home_dotfiles() {
        let paths = config_paths();
        if dirs::home_dir().is_some() {
            let last = paths.last().unwrap();
            assert!(last.ends_with(".backdrop.json"));
        }
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff8000").unwrap(), Rgba([255, 128, 0, 255]));
        assert_eq!(parse_hex_color("00000080").unwrap(), Rgba([0, 0, 0, 128]));
        assert_eq!(parse_hex_color(" #FFFFFF ").unwrap(), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_parse_hex_color_rejects_garbage() {
        assert!(parse_hex_color("").is_err());
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
        assert!(parse_hex_color("#ééé").is_err());
        assert!(parse_hex_color("red").is_err());
    }
}
