//! The redraw cycle.
//!
//! A [`Session`] carries everything a redraw needs (tracked screen geometry,
//! loaded images, compositor options) and drives resolve, composite and
//! present against a [`DisplayBackend`], once or every time the geometry
//! changes.

use crate::error::BackdropError;
use crate::geometry::{GeometryResolver, Layout, MonitorSource, Rect};
use crate::wallpaper::{CompositorOptions, ImageSet, Presenter, composite};

/// A display that reports monitors, shows composites and announces geometry
/// changes.
pub trait DisplayBackend: MonitorSource + Presenter {
    /// Blocks until the screen geometry changes.
    ///
    /// Returns the new screen size, or `None` once no further notifications
    /// can arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on the display failed.
    fn wait_for_geometry_change(&mut self) -> Result<Option<(u16, u16)>, BackdropError>;
}

/// Whether to draw once or keep the background up to date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Draw one frame and return.
    #[default]
    Once,
    /// Redraw after every geometry change until the display goes away.
    Resident,
}

/// Per-process redraw context.
#[derive(Debug)]
pub struct Session {
    resolver: GeometryResolver,
    images: ImageSet,
    options: CompositorOptions,
}

impl Session {
    /// Creates a session for a screen of the given geometry.
    #[must_use]
    pub const fn new(screen: Rect, images: ImageSet, options: CompositorOptions) -> Self {
        Self { resolver: GeometryResolver::new(screen), images, options }
    }

    /// Currently tracked screen geometry.
    #[must_use]
    pub const fn screen(&self) -> Rect { self.resolver.screen() }

    /// Runs one resolve, composite, present cycle.
    ///
    /// # Errors
    ///
    /// Returns the first error of any step; nothing is presented in that case.
    pub fn redraw<D>(&self, display: &mut D) -> Result<Layout, BackdropError>
    where
        D: DisplayBackend + ?Sized,
    {
        let layout = self.resolver.resolve(display)?;
        let buffer = composite(&layout, &self.images, &self.options)?;
        display.present(&buffer)?;

        tracing::info!(
            monitors = layout.monitors.len(),
            images = self.images.len(),
            screen = %layout.screen,
            mode = ?self.options.mode,
            "background drawn"
        );

        Ok(layout)
    }

    /// Draws the background and, in [`RunMode::Resident`], keeps redrawing
    /// after every geometry change.
    ///
    /// Returns the number of frames drawn.
    ///
    /// # Errors
    ///
    /// Stops at the first failing cycle and returns its error.
    pub fn run<D>(&mut self, display: &mut D, mode: RunMode) -> Result<usize, BackdropError>
    where
        D: DisplayBackend + ?Sized,
    {
        let mut frames = 0;

        loop {
            self.redraw(display)?;
            frames += 1;

            if mode == RunMode::Once {
                return Ok(frames);
            }

            let Some((width, height)) = display.wait_for_geometry_change()? else {
                tracing::info!(frames, "display closed, stopping");
                return Ok(frames);
            };

            tracing::debug!(width, height, "screen geometry changed");
            self.resolver.set_screen_size(u32::from(width), u32::from(height));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::wallpaper::{CompositeBuffer, SourceImage};

    /// Display without multi-head support that replays queued size changes.
    #[derive(Default)]
    struct FakeDisplay {
        changes: VecDeque<(u16, u16)>,
        presented: Vec<(u32, u32)>,
        fail_present: bool,
    }

    impl MonitorSource for FakeDisplay {
        fn query_monitors(&mut self) -> Result<Option<Vec<Rect>>, BackdropError> { Ok(None) }
    }

    impl Presenter for FakeDisplay {
        fn present(&mut self, buffer: &CompositeBuffer) -> Result<(), BackdropError> {
            if self.fail_present {
                return Err(BackdropError::DisplayError("pixmap".to_string()));
            }
            self.presented.push(buffer.dimensions());
            Ok(())
        }
    }

    impl DisplayBackend for FakeDisplay {
        fn wait_for_geometry_change(&mut self) -> Result<Option<(u16, u16)>, BackdropError> {
            Ok(self.changes.pop_front())
        }
    }

    fn session() -> Session {
        let image = RgbaImage::from_pixel(8, 6, Rgba([1, 2, 3, 255]));
        let images = ImageSet::from_images([SourceImage::new("a.png", image)]).unwrap();
        Session::new(Rect::from_size(64, 48), images, CompositorOptions::default())
    }

    #[test]
    fn test_run_once_draws_single_frame() {
        let mut display =
            FakeDisplay { changes: VecDeque::from([(10, 10)]), ..FakeDisplay::default() };

        let frames = session().run(&mut display, RunMode::Once).unwrap();

        assert_eq!(frames, 1);
        assert_eq!(display.presented, vec![(64, 48)]);
        // The queued change was never consumed.
        assert_eq!(display.changes.len(), 1);
    }

    #[test]
    fn test_resident_redraws_on_every_change() {
        let mut display = FakeDisplay {
            changes: VecDeque::from([(32, 32), (100, 20)]),
            ..FakeDisplay::default()
        };
        let mut session = session();

        let frames = session.run(&mut display, RunMode::Resident).unwrap();

        assert_eq!(frames, 3);
        assert_eq!(display.presented, vec![(64, 48), (32, 32), (100, 20)]);
        assert_eq!(session.screen(), Rect::from_size(100, 20));
    }

    #[test]
    fn test_failed_cycle_stops_the_loop() {
        let mut display = FakeDisplay {
            changes: VecDeque::from([(32, 32)]),
            fail_present: true,
            ..FakeDisplay::default()
        };

        let result = session().run(&mut display, RunMode::Resident);

        assert!(matches!(result, Err(BackdropError::DisplayError(_))));
        assert_eq!(display.changes.len(), 1);
    }

    #[test]
    fn test_redraw_returns_resolved_layout() {
        let mut display = FakeDisplay::default();
        let layout = session().redraw(&mut display).unwrap();

        assert_eq!(layout.monitors.as_slice(), &[Rect::from_size(64, 48)]);
    }
}
