//! X11 display backend.
//!
//! Owns the connection to the X server and implements [`DisplayBackend`]:
//! monitors come from RandR (1.5 or newer) or Xinerama, composites are
//! uploaded into a root-depth pixmap and installed as the root window
//! background, and geometry changes arrive as `ConfigureNotify` on the root.

use image::RgbaImage;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::ConnectionError;
use x11rb::protocol::Event;
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xinerama::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ConnectionExt as _, CreateGCAux, EventMask, ImageFormat,
    ImageOrder, Screen, Setup, VisualClass, Visualtype, Window,
};
use x11rb::rust_connection::RustConnection;

use crate::error::BackdropError;
use crate::geometry::{MonitorSource, Rect};
use crate::session::DisplayBackend;
use crate::wallpaper::{CompositeBuffer, Presenter};

/// Size of the fixed part of a `PutImage` request.
const PUT_IMAGE_HEADER_BYTES: usize = 24;

/// Which extension, if any, reports the monitor layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MultiHead {
    RandR,
    Xinerama,
    None,
}

/// Connection to an X server and its default screen.
pub struct X11Display {
    conn: RustConnection,
    root: Window,
    width: u16,
    height: u16,
    depth: u8,
    format: PixelFormat,
    multihead: MultiHead,
}

impl X11Display {
    /// Opens the display named by `$DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the display cannot be opened, its root visual is
    /// not a 32 bits-per-pixel TrueColor visual, or root window events cannot
    /// be selected.
    pub fn connect() -> Result<Self, BackdropError> {
        let (conn, screen_num) = x11rb::connect(None)?;

        let screen = conn.setup().roots.get(screen_num).ok_or_else(|| {
            BackdropError::DisplayError(format!("invalid screen number {screen_num}"))
        })?;
        let root = screen.root;
        let width = screen.width_in_pixels;
        let height = screen.height_in_pixels;
        let depth = screen.root_depth;
        let format = PixelFormat::for_screen(conn.setup(), screen)?;

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
        )?
        .check()?;

        let multihead = detect_multihead(&conn)?;
        conn.flush()?;

        tracing::debug!(
            width,
            height,
            depth,
            multihead = ?multihead,
            "connected to X server"
        );

        Ok(Self { conn, root, width, height, depth, format, multihead })
    }

    /// Geometry of the root window.
    #[must_use]
    pub fn screen_rect(&self) -> Rect {
        Rect::from_size(u32::from(self.width.max(1)), u32::from(self.height.max(1)))
    }

    fn upload(&self, pixmap: u32, gc: u32, buffer: &CompositeBuffer) -> Result<(), BackdropError> {
        let (width, height) = buffer.dimensions();
        let width = to_u16(width)?;
        let height = to_u16(height)?;
        let data = self.format.encode(buffer);
        let stride = usize::from(width) * 4;
        let rows = rows_per_request(self.conn.maximum_request_bytes(), stride).ok_or_else(|| {
            BackdropError::DisplayError(format!("a {width} pixel row exceeds the request limit"))
        })?;

        for (index, strip) in data.chunks(stride * rows).enumerate() {
            let top = index * rows;
            let strip_rows = strip.len() / stride;
            self.conn.put_image(
                ImageFormat::Z_PIXMAP,
                pixmap,
                gc,
                width,
                to_u16(strip_rows)?,
                0,
                to_i16(top)?,
                0,
                self.depth,
                strip,
            )?
            .check()?;
        }

        tracing::trace!(width, height, rows_per_request = rows, "uploaded composite");
        Ok(())
    }
}

impl MonitorSource for X11Display {
    fn query_monitors(&mut self) -> Result<Option<Vec<Rect>>, BackdropError> {
        let monitors = match self.multihead {
            MultiHead::RandR => self
                .conn
                .randr_get_monitors(self.root, true)?
                .reply()?
                .monitors
                .iter()
                .map(|m| Rect::new(m.x.into(), m.y.into(), m.width.into(), m.height.into()))
                .collect(),
            MultiHead::Xinerama => self
                .conn
                .xinerama_query_screens()?
                .reply()?
                .screen_info
                .iter()
                .map(|s| Rect::new(s.x_org.into(), s.y_org.into(), s.width.into(), s.height.into()))
                .collect(),
            MultiHead::None => return Ok(None),
        };

        Ok(Some(monitors))
    }
}

impl Presenter for X11Display {
    fn present(&mut self, buffer: &CompositeBuffer) -> Result<(), BackdropError> {
        let (width, height) = buffer.dimensions();

        let pixmap = self.conn.generate_id()?;
        self.conn
            .create_pixmap(self.depth, pixmap, self.root, to_u16(width)?, to_u16(height)?)?
            .check()?;

        let drawn = self.install(pixmap, buffer);

        // The root keeps its own reference to the background pixmap.
        self.conn.free_pixmap(pixmap)?;
        self.conn.flush()?;

        drawn
    }
}

impl X11Display {
    /// Uploads `buffer` into `pixmap` and makes it the root background.
    fn install(&self, pixmap: u32, buffer: &CompositeBuffer) -> Result<(), BackdropError> {
        let gc = self.conn.generate_id()?;
        self.conn.create_gc(gc, pixmap, &CreateGCAux::new())?.check()?;

        let uploaded = self.upload(pixmap, gc, buffer);
        self.conn.free_gc(gc)?;
        uploaded?;

        self.conn
            .change_window_attributes(
                self.root,
                &ChangeWindowAttributesAux::new().background_pixmap(pixmap),
            )?
            .check()?;
        self.conn.clear_area(false, self.root, 0, 0, 0, 0)?.check()?;

        Ok(())
    }
}

impl DisplayBackend for X11Display {
    fn wait_for_geometry_change(&mut self) -> Result<Option<(u16, u16)>, BackdropError> {
        loop {
            match self.conn.wait_for_event() {
                Ok(event) => {
                    if let Some((width, height)) = root_resize(event, self.root)? {
                        self.width = width;
                        self.height = height;
                        return Ok(Some((width, height)));
                    }
                }
                Err(ConnectionError::IoError(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Picks the new root size out of `event`.
///
/// Errors from unchecked requests arrive as events too and are fatal.
fn root_resize(event: Event, root: Window) -> Result<Option<(u16, u16)>, BackdropError> {
    match event {
        Event::ConfigureNotify(event) if event.window == root => {
            Ok(Some((event.width.max(1), event.height.max(1))))
        }
        Event::Error(err) => Err(err.into()),
        event => {
            tracing::trace!(event = ?event, "ignoring event");
            Ok(None)
        }
    }
}

fn detect_multihead(conn: &RustConnection) -> Result<MultiHead, BackdropError> {
    if conn.extension_information(randr::X11_EXTENSION_NAME)?.is_some() {
        let version = conn.randr_query_version(1, 5)?.reply()?;
        if (version.major_version, version.minor_version) >= (1, 5) {
            return Ok(MultiHead::RandR);
        }
        tracing::debug!(
            major = version.major_version,
            minor = version.minor_version,
            "RandR too old for GetMonitors"
        );
    }

    if conn.extension_information(xinerama::X11_EXTENSION_NAME)?.is_some()
        && conn.xinerama_is_active()?.reply()?.state != 0
    {
        return Ok(MultiHead::Xinerama);
    }

    Ok(MultiHead::None)
}

/// How RGB values are packed into a 32 bits-per-pixel Z-format image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    red_shift: u32,
    green_shift: u32,
    blue_shift: u32,
    byte_order: ImageOrder,
}

impl PixelFormat {
    /// Derives the pixel layout of `screen`'s root visual.
    ///
    /// # Errors
    ///
    /// Returns [`BackdropError::DisplayError`] if the root visual cannot be
    /// found or is not supported.
    pub fn for_screen(setup: &Setup, screen: &Screen) -> Result<Self, BackdropError> {
        let visual = screen
            .allowed_depths
            .iter()
            .flat_map(|depth| depth.visuals.iter())
            .find(|visual| visual.visual_id == screen.root_visual)
            .ok_or_else(|| {
                BackdropError::DisplayError(format!(
                    "could not find root visual {}",
                    screen.root_visual
                ))
            })?;

        let bits_per_pixel = setup
            .pixmap_formats
            .iter()
            .find(|format| format.depth == screen.root_depth)
            .map_or(0, |format| format.bits_per_pixel);

        Self::new(visual, screen.root_depth, bits_per_pixel, setup.image_byte_order)
    }

    /// Builds the layout for a visual of the given depth.
    ///
    /// # Errors
    ///
    /// Returns [`BackdropError::DisplayError`] unless the visual is TrueColor
    /// and pixmaps of its depth use 32 bits per pixel.
    pub fn new(
        visual: &Visualtype,
        depth: u8,
        bits_per_pixel: u8,
        byte_order: ImageOrder,
    ) -> Result<Self, BackdropError> {
        if visual.class != VisualClass::TRUE_COLOR || bits_per_pixel != 32 {
            return Err(BackdropError::DisplayError(format!(
                "unsupported visual: {depth}-bit {:?} at {bits_per_pixel} bpp, expected 32 bpp TrueColor",
                visual.class
            )));
        }

        Ok(Self {
            red_shift: visual.red_mask.trailing_zeros(),
            green_shift: visual.green_mask.trailing_zeros(),
            blue_shift: visual.blue_mask.trailing_zeros(),
            byte_order,
        })
    }

    /// Packs every pixel of `buffer`, dropping alpha.
    #[must_use]
    pub fn encode(&self, buffer: &RgbaImage) -> Vec<u8> {
        let mut data = Vec::with_capacity(buffer.as_raw().len());

        for pixel in buffer.pixels() {
            let [r, g, b, _] = pixel.0;
            let value = (u32::from(r) << self.red_shift)
                | (u32::from(g) << self.green_shift)
                | (u32::from(b) << self.blue_shift);
            let bytes = if self.byte_order == ImageOrder::MSB_FIRST {
                value.to_be_bytes()
            } else {
                value.to_le_bytes()
            };
            data.extend_from_slice(&bytes);
        }

        data
    }
}

/// Number of `stride`-byte rows that fit in one `PutImage` request.
fn rows_per_request(max_request_bytes: usize, stride: usize) -> Option<usize> {
    if stride == 0 {
        return None;
    }
    let rows = max_request_bytes.saturating_sub(PUT_IMAGE_HEADER_BYTES) / stride;
    (rows > 0).then_some(rows)
}

fn to_u16<T>(value: T) -> Result<u16, BackdropError>
where
    T: TryInto<u16> + Copy + std::fmt::Display,
{
    value
        .try_into()
        .map_err(|_| BackdropError::DisplayError(format!("{value} exceeds the X11 coordinate range")))
}

fn to_i16(value: usize) -> Result<i16, BackdropError> {
    i16::try_from(value)
        .map_err(|_| BackdropError::DisplayError(format!("{value} exceeds the X11 coordinate range")))
}
