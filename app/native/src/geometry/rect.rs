//! Integer rectangle used for monitors, crops and image sizes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle with integer origin and unsigned extent.
///
/// Monitors use it in virtual-screen coordinates; image crops use it in the
/// pixel space of the source image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle of the given size at the origin.
    #[must_use]
    pub const fn from_size(width: u32, height: u32) -> Self { Self::new(0, 0, width, height) }

    /// Returns `true` when both extents are non-zero.
    #[must_use]
    pub const fn is_valid(&self) -> bool { self.width > 0 && self.height > 0 }

    /// Returns `(width, height)`.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) { (self.width, self.height) }

    /// Exclusive right edge.
    #[must_use]
    pub fn right(&self) -> i64 { i64::from(self.x) + i64::from(self.width) }

    /// Exclusive bottom edge.
    #[must_use]
    pub fn bottom(&self) -> i64 { i64::from(self.y) + i64::from(self.height) }

    /// Returns `true` if the rectangle is wider than it is tall.
    #[must_use]
    pub const fn is_landscape(&self) -> bool { self.width > self.height }

    /// Returns `true` if the rectangle is taller than it is wide.
    #[must_use]
    pub const fn is_portrait(&self) -> bool { self.width < self.height }

    /// Smallest rectangle enclosing every rectangle in `rects`.
    ///
    /// Returns `None` for an empty iterator.
    #[must_use]
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        let mut iter = rects.into_iter();
        let first = iter.next()?;

        let (mut left, mut top) = (i64::from(first.x), i64::from(first.y));
        let (mut right, mut bottom) = (first.right(), first.bottom());
        for rect in iter {
            left = left.min(i64::from(rect.x));
            top = top.min(i64::from(rect.y));
            right = right.max(rect.right());
            bottom = bottom.max(rect.bottom());
        }

        Some(Self::new(
            i32::try_from(left).ok()?,
            i32::try_from(top).ok()?,
            u32::try_from(right - left).ok()?,
            u32::try_from(bottom - top).ok()?,
        ))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}
