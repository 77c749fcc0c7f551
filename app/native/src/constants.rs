//! Application-wide constants.

/// Name used for the binary, log prefixes and configuration directories.
pub const APP_NAME: &str = "backdrop";

/// Application version from Cargo.toml.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of monitors drawn and images kept loaded.
///
/// Anything past this many is dropped, keeping the first entries in the order
/// they were discovered (monitors) or given (images).
pub const MAX_OUTPUTS: usize = 8;

/// Image file extensions picked up when a directory is given as an image path.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp"];
