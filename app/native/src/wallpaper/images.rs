//! Source images.
//!
//! Images are decoded once at startup into an [`ImageSet`] and never touched
//! again: every redraw reads them through a transform descriptor, so the same
//! image can back several monitors.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use natord::compare;
use smallvec::SmallVec;

use crate::constants::{MAX_OUTPUTS, SUPPORTED_EXTENSIONS};
use crate::error::BackdropError;

/// Decodes image files into pixel buffers.
pub trait ImageLoader {
    /// Loads the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    fn load(&mut self, path: &Path) -> Result<RgbaImage, BackdropError>;
}

impl<F> ImageLoader for F
where
    F: FnMut(&Path) -> Result<RgbaImage, BackdropError>,
{
    fn load(&mut self, path: &Path) -> Result<RgbaImage, BackdropError> { self(path) }
}

/// Loads images from disk with the `image` crate, guessing the format from
/// the file contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl ImageLoader for FileLoader {
    fn load(&mut self, path: &Path) -> Result<RgbaImage, BackdropError> {
        let failed = |err: &dyn std::fmt::Display| {
            BackdropError::ImageError(format!("{}: {err}", path.display()))
        };

        let image = ImageReader::open(path)
            .map_err(|e| failed(&e))?
            .with_guessed_format()
            .map_err(|e| failed(&e))?
            .decode()
            .map_err(|e| failed(&e))?;

        Ok(image.into_rgba8())
    }
}

/// A decoded image and where it came from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    path: PathBuf,
    pixels: RgbaImage,
}

impl SourceImage {
    /// Wraps an already decoded image.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, pixels: RgbaImage) -> Self {
        Self { path: path.into(), pixels }
    }

    /// Path the image was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Decoded pixels.
    #[must_use]
    pub const fn pixels(&self) -> &RgbaImage { &self.pixels }

    /// Natural `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) { self.pixels.dimensions() }
}

/// The loaded images, at least one and at most [`MAX_OUTPUTS`].
#[derive(Debug, Clone)]
pub struct ImageSet {
    images: SmallVec<[SourceImage; MAX_OUTPUTS]>,
}

impl ImageSet {
    /// Loads `paths` in order until [`MAX_OUTPUTS`] images have loaded.
    ///
    /// A file that fails to load is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BackdropError::NoImages`] if nothing could be loaded.
    pub fn load<L>(paths: &[PathBuf], loader: &mut L) -> Result<Self, BackdropError>
    where
        L: ImageLoader + ?Sized,
    {
        let mut images = SmallVec::new();

        for path in paths {
            if images.len() == MAX_OUTPUTS {
                tracing::warn!(
                    path = %path.display(),
                    limit = MAX_OUTPUTS,
                    "too many images, ignoring the rest"
                );
                break;
            }

            match loader.load(path) {
                Ok(pixels) if pixels.width() > 0 && pixels.height() > 0 => {
                    tracing::debug!(
                        path = %path.display(),
                        width = pixels.width(),
                        height = pixels.height(),
                        "loaded image"
                    );
                    images.push(SourceImage::new(path, pixels));
                }
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "cannot load empty image, ignoring");
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "cannot load file, ignoring");
                }
            }
        }

        Self::from_loaded(images)
    }

    /// Builds a set from already decoded images, keeping the first
    /// [`MAX_OUTPUTS`] non-empty ones.
    ///
    /// # Errors
    ///
    /// Returns [`BackdropError::NoImages`] if no usable image was given.
    pub fn from_images(
        images: impl IntoIterator<Item = SourceImage>,
    ) -> Result<Self, BackdropError> {
        Self::from_loaded(
            images
                .into_iter()
                .filter(|image| image.pixels.width() > 0 && image.pixels.height() > 0)
                .take(MAX_OUTPUTS)
                .collect(),
        )
    }

    fn from_loaded(images: SmallVec<[SourceImage; MAX_OUTPUTS]>) -> Result<Self, BackdropError> {
        if images.is_empty() {
            return Err(BackdropError::NoImages);
        }
        Ok(Self { images })
    }

    /// Number of loaded images.
    #[must_use]
    pub fn len(&self) -> usize { self.images.len() }

    /// Always `false`; an `ImageSet` holds at least one image.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.images.is_empty() }

    /// Image drawn on the monitor at `index`.
    ///
    /// Images are handed out round-robin, so monitor `i` gets image
    /// `i mod len`.
    #[must_use]
    pub fn for_monitor(&self, index: usize) -> &SourceImage {
        &self.images[index % self.images.len()]
    }

    /// Iterates over the images in load order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceImage> { self.images.iter() }
}

/// Expands the user-supplied image arguments into file paths.
///
/// `~` is expanded and relative paths are resolved against `base_dir` when
/// one is given. A directory stands for every supported image inside it,
/// in natural sort order. The result is unbounded: [`ImageSet::load`]
/// applies the limit after skipping files that fail to load.
#[must_use]
pub fn expand_paths<S: AsRef<str>>(args: &[S], base_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for arg in args {
        let path = expand_path(arg.as_ref(), base_dir);
        if path.as_os_str().is_empty() {
            continue;
        }

        if path.is_dir() {
            let listed = list_images_in_directory(&path);
            if listed.is_empty() {
                tracing::warn!(path = %path.display(), "no images found in directory");
            }
            paths.extend(listed);
        } else {
            paths.push(path);
        }
    }

    paths
}

/// Expands `~` and resolves a relative path against `base_dir`.
fn expand_path(raw: &str, base_dir: Option<&Path>) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() {
        return PathBuf::new();
    }

    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    match base_dir {
        Some(base) if expanded.is_relative() => base.join(expanded),
        _ => expanded,
    }
}

/// Checks if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Lists the supported image files in a directory, naturally sorted.
fn list_images_in_directory(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_supported_image(path))
            .collect(),
        Err(err) => {
            tracing::warn!(path = %dir.display(), error = %err, "cannot read directory");
            Vec::new()
        }
    };

    images.sort_by(|a, b| compare(&a.to_string_lossy(), &b.to_string_lossy()));
    images
}
