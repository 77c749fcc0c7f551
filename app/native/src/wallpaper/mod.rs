//! Background composition.
//!
//! - [`placement`] decides, per monitor, which part of an image goes where
//! - [`images`] holds the decoded source images
//! - [`compositor`] draws all placements into one virtual-screen buffer

pub mod compositor;
pub mod images;
pub mod placement;

pub use compositor::{CompositeBuffer, CompositorOptions, Presenter, ResizeFilter, composite};
pub use images::{FileLoader, ImageLoader, ImageSet, SourceImage, expand_paths};
pub use placement::{Placement, PlacementMode, RotatePolicy, place};
