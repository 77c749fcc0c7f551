//! Geometry resolution.
//!
//! Asks a [`MonitorSource`] for the current monitor rectangles and turns the
//! answer into a [`Layout`]: a bounded, ordered monitor list plus the
//! virtual-screen rectangle the composite buffer is sized to.

use smallvec::SmallVec;

use super::Rect;
use crate::constants::MAX_OUTPUTS;
use crate::error::BackdropError;

/// Monitor rectangles in discovery order, never longer than [`MAX_OUTPUTS`].
pub type MonitorList = SmallVec<[Rect; MAX_OUTPUTS]>;

/// Something that can report the monitors of a display.
pub trait MonitorSource {
    /// Returns monitor rectangles in the order the environment reports them.
    ///
    /// `Ok(None)` means no multi-head information is available, in which case
    /// the whole screen is treated as a single monitor.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment could not be queried.
    fn query_monitors(&mut self) -> Result<Option<Vec<Rect>>, BackdropError>;
}

/// Result of one geometry resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Monitors to draw, at least one.
    pub monitors: MonitorList,
    /// The tracked root window geometry the composite is sized to.
    ///
    /// This is not a bounding box: a monitor reported before the matching
    /// size change arrives may lie partly outside it and is clipped.
    pub screen: Rect,
}

/// Resolves monitor layouts relative to the tracked screen rectangle.
///
/// The screen rectangle is seeded from the display's full dimensions and only
/// changes through [`GeometryResolver::set_screen_size`], which the redraw loop
/// calls when a geometry-change notification arrives.
#[derive(Debug, Clone)]
pub struct GeometryResolver {
    screen: Rect,
}

impl GeometryResolver {
    /// Creates a resolver for a screen of the given geometry.
    #[must_use]
    pub const fn new(screen: Rect) -> Self { Self { screen } }

    /// Returns the tracked screen rectangle.
    #[must_use]
    pub const fn screen(&self) -> Rect { self.screen }

    /// Updates the tracked screen size after a geometry change.
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen.width = width.max(1);
        self.screen.height = height.max(1);
    }

    /// Queries `source` and builds the current layout.
    ///
    /// # Errors
    ///
    /// Returns [`BackdropError::NoMonitors`] if no usable monitor remains, or
    /// whatever error the source reports.
    pub fn resolve<S>(&self, source: &mut S) -> Result<Layout, BackdropError>
    where
        S: MonitorSource + ?Sized,
    {
        let reported = source.query_monitors()?.unwrap_or_else(|| {
            tracing::debug!(screen = %self.screen, "no multi-head information, using whole screen");
            vec![self.screen]
        });

        let monitors = bounded(reported);
        if monitors.is_empty() {
            return Err(BackdropError::NoMonitors);
        }

        Ok(Layout { monitors, screen: self.screen })
    }
}

/// Keeps the first [`MAX_OUTPUTS`] usable rectangles in their original order.
fn bounded(reported: Vec<Rect>) -> MonitorList {
    let mut monitors = MonitorList::new();
    let mut dropped = 0_usize;

    for rect in reported {
        if !rect.is_valid() {
            tracing::debug!(monitor = %rect, "ignoring monitor with empty geometry");
        } else if monitors.len() < MAX_OUTPUTS {
            monitors.push(rect);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, limit = MAX_OUTPUTS, "too many monitors, ignoring the rest");
    }

    monitors
}

/// A [`MonitorSource`] over a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticMonitors {
    monitors: Option<Vec<Rect>>,
}

impl StaticMonitors {
    /// Reports exactly `monitors` on every query.
    #[must_use]
    pub const fn new(monitors: Vec<Rect>) -> Self { Self { monitors: Some(monitors) } }

    /// Reports that no multi-head information is available.
    #[must_use]
    pub const fn without_multihead() -> Self { Self { monitors: None } }
}

impl MonitorSource for StaticMonitors {
    fn query_monitors(&mut self) -> Result<Option<Vec<Rect>>, BackdropError> {
        Ok(self.monitors.clone())
    }
}
