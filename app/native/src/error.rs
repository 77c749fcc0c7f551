//! Error types for Backdrop.
//!
//! Every fatal condition ends up as a [`BackdropError`]. Per-image load
//! failures are not errors at this level: they are logged and the image is
//! left out of the set.

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::x11_utils::X11Error;

/// Errors that abort a redraw cycle and, with it, the process.
#[derive(Debug, Error)]
pub enum BackdropError {
    /// None of the requested images could be loaded.
    #[error("No image to draw")]
    NoImages,
    /// The display reported no usable monitor.
    #[error("No monitors to configure")]
    NoMonitors,
    /// The composite buffer could not be allocated.
    #[error("Cannot allocate a {width}x{height} composite buffer")]
    BufferAllocation { width: u32, height: u32 },
    /// Talking to the display server failed.
    #[error("Display error: {0}")]
    DisplayError(String),
    /// The configuration file could not be used.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// A single image could not be decoded.
    #[error("Image error: {0}")]
    ImageError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for BackdropError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<ConnectError> for BackdropError {
    fn from(err: ConnectError) -> Self { Self::DisplayError(format!("cannot open display: {err}")) }
}

impl From<ConnectionError> for BackdropError {
    fn from(err: ConnectionError) -> Self { Self::DisplayError(err.to_string()) }
}

impl From<ReplyError> for BackdropError {
    fn from(err: ReplyError) -> Self { Self::DisplayError(err.to_string()) }
}

impl From<X11Error> for BackdropError {
    fn from(err: X11Error) -> Self {
        Self::DisplayError(format!(
            "{:?} error in {}",
            err.error_kind,
            err.request_name.unwrap_or("request")
        ))
    }
}

impl From<ReplyOrIdError> for BackdropError {
    fn from(err: ReplyOrIdError) -> Self { Self::DisplayError(err.to_string()) }
}
