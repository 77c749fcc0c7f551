//! Per-monitor image placement.
//!
//! Works out how one source image is drawn onto one monitor without touching
//! any pixels. The result is a [`Placement`]: which part of the source to
//! take, whether to turn it, and where it ends up in the virtual screen.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// How an image is fitted to its monitor.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementMode {
    /// Scale uniformly until one edge meets the monitor, centered, letterboxed
    /// on the other axis.
    #[default]
    Scale,
    /// Draw at natural size, centered; crop whatever exceeds the monitor.
    Center,
    /// Scale each axis independently to fill the monitor exactly.
    Stretch,
}

/// Whether images are turned to match monitor orientation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RotatePolicy {
    /// Rotate a portrait image on a landscape monitor (and vice versa) by 90°,
    /// in every placement mode.
    #[default]
    Auto,
    /// Always draw images the way they are stored.
    Never,
}

/// Transform descriptor for drawing one source image onto one monitor.
///
/// Applied in order: crop `source` out of the image, rotate it 90° clockwise
/// if `rotate` is set, resample it to the size of `target` and draw it at
/// `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Region of the unrotated source image, in source pixels.
    pub source: Rect,
    /// Rotate the cropped region 90° clockwise before resampling.
    pub rotate: bool,
    /// Destination in virtual-screen coordinates.
    pub target: Rect,
}

impl Placement {
    /// Size of the cropped region after rotation.
    #[must_use]
    pub const fn oriented_size(&self) -> (u32, u32) {
        if self.rotate {
            (self.source.height, self.source.width)
        } else {
            (self.source.width, self.source.height)
        }
    }

    /// Returns `true` if the cropped region has to be resampled.
    #[must_use]
    pub const fn needs_resample(&self) -> bool {
        let (width, height) = self.oriented_size();
        width != self.target.width || height != self.target.height
    }
}

/// Computes how an image of `image` size is drawn on `monitor`.
///
/// Both `monitor` and `image` must have non-zero extents.
#[must_use]
pub fn place(
    mode: PlacementMode,
    policy: RotatePolicy,
    monitor: Rect,
    image: (u32, u32),
) -> Placement {
    let rotate = policy == RotatePolicy::Auto && orientation_differs(monitor, image);
    let (width, height) = if rotate { (image.1, image.0) } else { image };

    let (crop, target) = match mode {
        PlacementMode::Scale => (Rect::from_size(width, height), scale_to_fit(monitor, width, height)),
        PlacementMode::Center => center(monitor, width, height),
        PlacementMode::Stretch => (Rect::from_size(width, height), monitor),
    };

    let source = if rotate { unrotate(crop, image.1) } else { crop };
    Placement { source, rotate, target }
}

/// Landscape monitor with portrait image, or the other way around.
///
/// Square monitors and square images never count as a mismatch.
const fn orientation_differs(monitor: Rect, (width, height): (u32, u32)) -> bool {
    (monitor.is_landscape() && width < height) || (monitor.is_portrait() && width > height)
}

/// Largest uniformly scaled size that fits inside `monitor`, centered on it.
///
/// One edge always equals the monitor's; the ratio test runs on integers so
/// that edge is exact rather than subject to floating point truncation.
fn scale_to_fit(monitor: Rect, width: u32, height: u32) -> Rect {
    let (w, h) = (u64::from(width), u64::from(height));
    let (mw, mh) = (u64::from(monitor.width), u64::from(monitor.height));

    let (nw, nh) = if w * mh >= h * mw {
        (monitor.width, narrow(h * mw / w))
    } else {
        (narrow(w * mh / h), monitor.height)
    };

    Rect::new(
        monitor.x + half_gap(monitor.width, nw),
        monitor.y + half_gap(monitor.height, nh),
        nw,
        nh,
    )
}

/// Centers the image on `monitor`, cropping any axis where it is larger.
///
/// Returns the crop (in oriented image space) and the destination.
fn center(monitor: Rect, width: u32, height: u32) -> (Rect, Rect) {
    let (src_x, dst_x, out_w) = center_axis(monitor.width, width);
    let (src_y, dst_y, out_h) = center_axis(monitor.height, height);

    (
        Rect::new(src_x, src_y, out_w, out_h),
        Rect::new(monitor.x + dst_x, monitor.y + dst_y, out_w, out_h),
    )
}

/// One axis of [`center`]: `(crop offset, destination offset, extent)`.
///
/// An oversized image is cropped to the monitor around its middle and lands
/// flush with the monitor edge; a smaller one keeps its extent and is offset
/// by half the difference.
const fn center_axis(monitor: u32, image: u32) -> (i32, i32, u32) {
    if image > monitor {
        (half_gap(image, monitor), 0, monitor)
    } else {
        (0, half_gap(monitor, image), image)
    }
}

/// Maps a crop taken from the rotated image back onto the stored image.
///
/// For a clockwise quarter turn of a source `source_height` pixels tall,
/// rotated pixel `(x, y)` comes from source pixel `(y, source_height - 1 - x)`.
#[allow(clippy::cast_possible_wrap)]
const fn unrotate(crop: Rect, source_height: u32) -> Rect {
    let source_y = source_height as i64 - crop.x as i64 - crop.width as i64;
    Rect::new(crop.y, source_y as i32, crop.height, crop.width)
}

/// Half the difference of two extents, floor division.
#[allow(clippy::cast_possible_wrap)]
const fn half_gap(outer: u32, inner: u32) -> i32 { (outer.saturating_sub(inner) / 2) as i32 }

/// Converts a computed extent back to `u32`; never zero.
fn narrow(value: u64) -> u32 { u32::try_from(value).unwrap_or(u32::MAX).max(1) }
