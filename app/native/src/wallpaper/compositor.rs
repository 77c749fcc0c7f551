//! Composites every monitor's placement into one virtual-screen buffer.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::images::ImageSet;
use super::placement::{Placement, PlacementMode, RotatePolicy, place};
use crate::error::BackdropError;
use crate::geometry::{Layout, Rect};

/// Pixel buffer covering the whole virtual screen.
pub type CompositeBuffer = RgbaImage;

/// Largest buffer the compositor will try to allocate, in bytes.
///
/// The X11 protocol caps screens at 32767 pixels per side, so anything past
/// this is a broken geometry report rather than a real screen.
const MAX_BUFFER_BYTES: u64 = 32_767 * 32_767 * 4;

/// Hands a finished composite to whatever displays it.
pub trait Presenter {
    /// Shows `buffer` as the desktop background.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer could not be presented.
    fn present(&mut self, buffer: &CompositeBuffer) -> Result<(), BackdropError>;
}

/// Resampling filter used when an image has to change size.
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
pub enum ResizeFilter {
    /// Nearest neighbour.
    Nearest,
    /// Linear.
    Triangle,
    /// Cubic; sharp and fast enough for large screens.
    #[default]
    CatmullRom,
    /// Gaussian.
    Gaussian,
    /// Lanczos with window 3; best quality, slowest.
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => Self::Nearest,
            ResizeFilter::Triangle => Self::Triangle,
            ResizeFilter::CatmullRom => Self::CatmullRom,
            ResizeFilter::Gaussian => Self::Gaussian,
            ResizeFilter::Lanczos3 => Self::Lanczos3,
        }
    }
}

/// Everything about a redraw that stays fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorOptions {
    /// How each image is fitted to its monitor.
    pub mode: PlacementMode,
    /// Whether images are turned to match monitor orientation.
    pub rotate: RotatePolicy,
    /// Colour of every pixel no image covers.
    pub background: Rgba<u8>,
    /// Resampling filter.
    pub filter: ResizeFilter,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            mode: PlacementMode::default(),
            rotate: RotatePolicy::default(),
            background: Rgba([0, 0, 0, 255]),
            filter: ResizeFilter::default(),
        }
    }
}

/// Draws every monitor of `layout` into a new buffer the size of the screen.
///
/// Monitor `i` shows `images.for_monitor(i)`. Source images are only read;
/// each monitor works from its own cropped copy. Monitors are assumed not to
/// overlap; where they do, the later one wins.
///
/// # Errors
///
/// Returns [`BackdropError::BufferAllocation`] if the buffer cannot be
/// allocated. Nothing is drawn in that case.
pub fn composite(
    layout: &Layout,
    images: &ImageSet,
    options: &CompositorOptions,
) -> Result<CompositeBuffer, BackdropError> {
    let mut buffer = allocate(layout.screen, options.background)?;

    for (index, monitor) in layout.monitors.iter().enumerate() {
        let image = images.for_monitor(index);
        let placement = place(options.mode, options.rotate, *monitor, image.dimensions());

        tracing::debug!(
            monitor = index,
            geometry = %monitor,
            image = %image.path().display(),
            source = %placement.source,
            rotate = placement.rotate,
            target = %placement.target,
            "placing image"
        );

        let tile = render(image.pixels(), &placement, options.filter.into());
        imageops::overlay(
            &mut buffer,
            &tile,
            i64::from(placement.target.x) - i64::from(layout.screen.x),
            i64::from(placement.target.y) - i64::from(layout.screen.y),
        );
    }

    Ok(buffer)
}

/// Allocates a buffer for `screen` filled with `fill`.
fn allocate(screen: Rect, fill: Rgba<u8>) -> Result<CompositeBuffer, BackdropError> {
    let (width, height) = screen.size();
    let failed = || BackdropError::BufferAllocation { width, height };

    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(4))
        .filter(|&bytes| bytes > 0 && bytes <= MAX_BUFFER_BYTES)
        .ok_or_else(failed)?;
    let len = usize::try_from(bytes).map_err(|_| failed())?;

    let mut raw = Vec::new();
    raw.try_reserve_exact(len).map_err(|_| failed())?;
    raw.extend(std::iter::repeat_n(fill.0, len / 4).flatten());

    RgbaImage::from_raw(width, height, raw).ok_or_else(failed)
}

/// Produces the pixels one placement draws: cropped, turned and resized.
fn render(source: &RgbaImage, placement: &Placement, filter: FilterType) -> RgbaImage {
    let crop = placement.source;
    let cropped = imageops::crop_imm(
        source,
        u32::try_from(crop.x).unwrap_or_default(),
        u32::try_from(crop.y).unwrap_or_default(),
        crop.width,
        crop.height,
    )
    .to_image();

    let oriented = if placement.rotate { imageops::rotate90(&cropped) } else { cropped };

    if placement.needs_resample() {
        imageops::resize(&oriented, placement.target.width, placement.target.height, filter)
    } else {
        oriented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MonitorList;
    use crate::wallpaper::images::SourceImage;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn layout(monitors: &[Rect]) -> Layout {
        Layout {
            monitors: monitors.iter().copied().collect::<MonitorList>(),
            screen: Rect::bounding(monitors).unwrap(),
        }
    }

    fn set(images: Vec<RgbaImage>) -> ImageSet {
        ImageSet::from_images(
            images.into_iter().enumerate().map(|(i, px)| SourceImage::new(format!("{i}.png"), px)),
        )
        .unwrap()
    }

    fn options(mode: PlacementMode) -> CompositorOptions {
        CompositorOptions { mode, filter: ResizeFilter::Nearest, ..CompositorOptions::default() }
    }

    #[test]
    fn test_buffer_matches_screen() {
        let layout = layout(&[Rect::new(0, 0, 40, 30), Rect::new(40, 0, 20, 30)]);
        let images = set(vec![RgbaImage::from_pixel(4, 3, RED)]);
        let buffer = composite(&layout, &images, &options(PlacementMode::Stretch)).unwrap();
        assert_eq!(buffer.dimensions(), (60, 30));
    }

    #[test]
    fn test_stretch_covers_every_monitor() {
        let layout = layout(&[Rect::new(0, 0, 40, 30), Rect::new(40, 0, 30, 40)]);
        let images = set(vec![RgbaImage::from_pixel(5, 5, RED)]);
        let buffer = composite(&layout, &images, &options(PlacementMode::Stretch)).unwrap();

        for monitor in &layout.monitors {
            for y in monitor.y..monitor.bottom() as i32 {
                for x in monitor.x..monitor.right() as i32 {
                    assert_eq!(buffer.get_pixel(x as u32, y as u32), &RED);
                }
            }
        }
        // Below the shorter monitor nothing is drawn.
        assert_eq!(buffer.get_pixel(10, 35), &BLACK);
    }

    #[test]
    fn test_scale_letterbox_keeps_background() {
        let layout = layout(&[Rect::new(0, 0, 40, 20)]);
        let images = set(vec![RgbaImage::from_pixel(10, 10, GREEN)]);
        let buffer = composite(&layout, &images, &options(PlacementMode::Scale)).unwrap();

        // 20x20 centered: columns 10..30.
        assert_eq!(buffer.get_pixel(9, 10), &BLACK);
        assert_eq!(buffer.get_pixel(10, 10), &GREEN);
        assert_eq!(buffer.get_pixel(29, 10), &GREEN);
        assert_eq!(buffer.get_pixel(30, 10), &BLACK);
    }

    #[test]
    fn test_center_crops_from_the_middle() {
        // 12x6 image: outer thirds red, middle third green.
        let image = RgbaImage::from_fn(12, 6, |x, _| if (4..8).contains(&x) { GREEN } else { RED });
        let layout = layout(&[Rect::new(0, 0, 4, 3)]);
        let buffer =
            composite(&layout, &set(vec![image]), &options(PlacementMode::Center)).unwrap();

        assert!(buffer.pixels().all(|p| *p == GREEN));
    }

    #[test]
    fn test_center_small_image_leaves_border() {
        let layout = layout(&[Rect::new(0, 0, 10, 10)]);
        let images = set(vec![RgbaImage::from_pixel(4, 4, RED)]);
        let buffer = composite(&layout, &images, &options(PlacementMode::Center)).unwrap();

        assert_eq!(buffer.get_pixel(2, 2), &BLACK);
        assert_eq!(buffer.get_pixel(3, 3), &RED);
        assert_eq!(buffer.get_pixel(6, 6), &RED);
        assert_eq!(buffer.get_pixel(7, 7), &BLACK);
    }

    #[test]
    fn test_round_robin_images_across_monitors() {
        let monitors: Vec<Rect> = (0..3).map(|i| Rect::new(i * 10, 0, 10, 10)).collect();
        let images =
            set(vec![RgbaImage::from_pixel(2, 2, RED), RgbaImage::from_pixel(2, 2, GREEN)]);
        let buffer =
            composite(&layout(&monitors), &images, &options(PlacementMode::Stretch)).unwrap();

        assert_eq!(buffer.get_pixel(5, 5), &RED);
        assert_eq!(buffer.get_pixel(15, 5), &GREEN);
        assert_eq!(buffer.get_pixel(25, 5), &RED);
    }

    #[test]
    fn test_rotation_turns_clockwise() {
        // Portrait 2x4 image, top half red, bottom half green.
        let image = RgbaImage::from_fn(2, 4, |_, y| if y < 2 { RED } else { GREEN });
        let layout = layout(&[Rect::new(0, 0, 4, 2)]);
        let buffer =
            composite(&layout, &set(vec![image]), &options(PlacementMode::Stretch)).unwrap();

        // A clockwise quarter turn puts the old top on the right.
        assert_eq!(buffer.get_pixel(0, 0), &GREEN);
        assert_eq!(buffer.get_pixel(3, 0), &RED);
    }

    #[test]
    fn test_monitor_offsets_are_relative_to_screen_origin() {
        let layout = layout(&[Rect::new(-10, 0, 10, 10), Rect::new(0, 0, 10, 10)]);
        let images =
            set(vec![RgbaImage::from_pixel(1, 1, RED), RgbaImage::from_pixel(1, 1, GREEN)]);
        let buffer = composite(&layout, &images, &options(PlacementMode::Stretch)).unwrap();

        assert_eq!(buffer.dimensions(), (20, 10));
        assert_eq!(buffer.get_pixel(0, 0), &RED);
        assert_eq!(buffer.get_pixel(19, 9), &GREEN);
    }

    #[test]
    fn test_transparent_pixels_show_background() {
        let background = Rgba([10, 20, 30, 255]);
        let layout = layout(&[Rect::new(0, 0, 4, 4)]);
        let images = set(vec![RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 0]))]);
        let opts = CompositorOptions { background, ..options(PlacementMode::Center) };

        let buffer = composite(&layout, &images, &opts).unwrap();
        assert!(buffer.pixels().all(|p| *p == background));
    }

    #[test]
    fn test_composite_is_deterministic() {
        let layout = layout(&[Rect::new(0, 0, 64, 36), Rect::new(64, 0, 36, 64)]);
        let gradient =
            RgbaImage::from_fn(50, 25, |x, y| Rgba([(x * 5) as u8, (y * 10) as u8, 7, 255]));
        let images = set(vec![gradient]);

        for mode in [PlacementMode::Scale, PlacementMode::Center, PlacementMode::Stretch] {
            let opts = CompositorOptions { mode, ..CompositorOptions::default() };
            let first = composite(&layout, &images, &opts).unwrap();
            let second = composite(&layout, &images, &opts).unwrap();
            assert_eq!(first.as_raw(), second.as_raw(), "{mode:?}");
        }
    }

    #[test]
    fn test_source_images_are_untouched() {
        let image = RgbaImage::from_fn(3, 5, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let images = set(vec![image.clone()]);
        let layout = layout(&[Rect::new(0, 0, 10, 4), Rect::new(10, 0, 4, 10)]);

        composite(&layout, &images, &CompositorOptions::default()).unwrap();
        assert_eq!(images.for_monitor(0).pixels(), &image);
    }

    #[test]
    fn test_empty_screen_is_allocation_failure() {
        let layout = Layout {
            monitors: std::iter::once(Rect::new(0, 0, 10, 10)).collect(),
            screen: Rect::from_size(0, 10),
        };
        let images = set(vec![RgbaImage::from_pixel(1, 1, RED)]);

        let result = composite(&layout, &images, &CompositorOptions::default());
        assert!(matches!(result, Err(BackdropError::BufferAllocation { width: 0, height: 10 })));
    }

    #[test]
    fn test_oversized_screen_is_allocation_failure() {
        let result = allocate(Rect::from_size(u32::MAX, u32::MAX), BLACK);
        assert!(matches!(result, Err(BackdropError::BufferAllocation { .. })));
    }

    #[test]
    fn test_allocate_fills_background() {
        let fill = Rgba([1, 2, 3, 4]);
        let buffer = allocate(Rect::from_size(3, 2), fill).unwrap();
        assert!(buffer.pixels().all(|p| *p == fill));
    }
}
