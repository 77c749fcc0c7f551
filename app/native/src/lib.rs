//! Backdrop - draws a desktop background across every monitor of an X11
//! screen.
//!
//! The library splits into a display-independent core and the X11 glue:
//!
//! - [`geometry`] turns the monitors reported by the display into a bounded,
//!   validated [`geometry::Layout`]
//! - [`wallpaper`] places and composites one image per monitor into a single
//!   screen-sized buffer
//! - [`session`] runs the resolve, composite, present cycle once or on every
//!   geometry change
//! - [`x11`] implements the display side on top of `x11rb`

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod session;
pub mod wallpaper;
pub mod x11;
