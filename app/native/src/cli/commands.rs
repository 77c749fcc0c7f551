//! CLI definition using Clap.
//!
//! `backdrop` takes no subcommands: the flags pick how images are fitted, and
//! the positional arguments name the images.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use image::Rgba;

use crate::config::{self, LoadedConfig};
use crate::constants::{APP_NAME, APP_VERSION};
use crate::error::BackdropError;
use crate::session::{RunMode, Session};
use crate::wallpaper::{
    CompositorOptions, FileLoader, ImageSet, PlacementMode, ResizeFilter, RotatePolicy,
    expand_paths,
};
use crate::x11::X11Display;

/// Backdrop - draws one image per monitor as the X11 root window background.
///
/// Images are assigned to monitors in order and reused round-robin when there
/// are more monitors than images. Directories are expanded to the images they
/// contain, in natural sort order.
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(author, version = APP_VERSION, about, long_about = None)]
pub struct Cli {
    /// Image files or directories. Falls back to `images` from the
    /// configuration file when empty.
    #[arg(value_name = "IMAGE")]
    images: Vec<String>,

    /// Draw images at natural size, centered and cropped to the monitor.
    #[arg(short, long, conflicts_with_all = ["stretch", "scale"])]
    center: bool,

    /// Stretch images to fill their monitor exactly.
    #[arg(short, long, conflicts_with = "scale")]
    stretch: bool,

    /// Scale images to fit their monitor, keeping the aspect ratio (default).
    #[arg(long)]
    scale: bool,

    /// Keep running and redraw whenever the screen geometry changes.
    #[arg(short = 'x', long, overrides_with = "once")]
    resident: bool,

    /// Draw once and exit, even if the configuration asks to stay resident.
    #[arg(long, overrides_with = "resident")]
    once: bool,

    /// Never rotate images to match monitor orientation.
    #[arg(long, overrides_with = "rotate")]
    no_rotate: bool,

    /// Rotate images to match monitor orientation (default).
    #[arg(long, overrides_with = "no_rotate")]
    rotate: bool,

    /// Colour of uncovered areas, as #rrggbb or #rrggbbaa.
    #[arg(long, value_name = "COLOR", value_parser = config::parse_hex_color)]
    background: Option<Rgba<u8>>,

    /// Resampling filter used when an image changes size.
    #[arg(long, value_enum, value_name = "FILTER")]
    filter: Option<ResizeFilter>,

    /// Read the configuration from this file instead of the default locations.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the configuration JSON Schema and exit.
    #[arg(long)]
    print_schema: bool,

    /// Log more; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Fully resolved run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Image paths, expanded and in order.
    pub images: Vec<PathBuf>,
    /// Compositor parameters.
    pub options: CompositorOptions,
    /// Draw once or stay resident.
    pub run_mode: RunMode,
}

impl Cli {
    /// How many times `-v` was given.
    #[must_use]
    pub const fn verbosity(&self) -> u8 { self.verbose }

    /// Combines the command line with `loaded`. Command line values win over
    /// the configuration file, which wins over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BackdropError::InvalidArguments`] if the configured
    /// background colour cannot be parsed.
    pub fn settings(&self, loaded: &LoadedConfig) -> Result<Settings, BackdropError> {
        let file = &loaded.config;

        let mode = if self.center {
            PlacementMode::Center
        } else if self.stretch {
            PlacementMode::Stretch
        } else if self.scale {
            PlacementMode::Scale
        } else {
            file.mode
        };
        let rotate = if self.no_rotate {
            RotatePolicy::Never
        } else if self.rotate {
            RotatePolicy::Auto
        } else {
            file.rotate
        };
        let background = match self.background {
            Some(color) => color,
            None => config::parse_hex_color(&file.background)
                .map_err(|err| BackdropError::InvalidArguments(format!("background: {err}")))?,
        };
        let filter = self.filter.unwrap_or(file.filter);

        let images = if self.images.is_empty() {
            expand_paths(&file.images, loaded.base_dir())
        } else {
            expand_paths(&self.images, None)
        };

        let resident = if self.resident || self.once { self.resident } else { file.resident };
        let run_mode = if resident { RunMode::Resident } else { RunMode::Once };

        Ok(Settings {
            images,
            options: CompositorOptions { mode, rotate, background, filter },
            run_mode,
        })
    }

    /// Executes the command.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: an unreadable configuration, no
    /// loadable image, no display, or a failed redraw.
    pub fn execute(&self) -> Result<(), BackdropError> {
        if self.print_schema {
            println!("{}", config::generate_schema_json());
            return Ok(());
        }

        let loaded = config::load(self.config.as_deref())
            .map_err(|err| BackdropError::ConfigError(err.to_string()))?;
        let settings = self.settings(&loaded)?;

        let images = ImageSet::load(&settings.images, &mut FileLoader)?;
        let mut display = X11Display::connect()?;
        let mut session = Session::new(display.screen_rect(), images, settings.options);

        let frames = session.run(&mut display, settings.run_mode)?;
        tracing::debug!(frames, "done");

        Ok(())
    }
}
