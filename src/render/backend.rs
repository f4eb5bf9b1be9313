use std::sync::Arc;

use image::{imageops, Rgba, RgbaImage};
use once_cell::sync::Lazy;
use resvg::{tiny_skia, usvg};

use super::artwork;
use super::payload::encode_png;
use crate::error::{RenderError, Result};

/// Imaging capabilities the compositor needs. Any backend that can decode
/// art, rasterize a scene, place one raster on another and crop-encode a
/// region can drive the renderer.
pub trait RasterBackend: Send + Sync {
    /// Decodes artwork into a `size × size` square, or `None` when it cannot.
    fn decode_art(&self, bytes: &[u8], size: u32) -> Option<RgbaImage> {
        artwork::decode_and_square(Some(bytes), size)
    }

    /// Rasterizes SVG scene markup onto a fresh `width × height` canvas.
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage>;

    /// Draws `raster` onto `canvas` with its top-left corner at `(x, y)`.
    fn place(&self, canvas: &mut RgbaImage, raster: &RgbaImage, x: u32, y: u32) -> Result<()> {
        check_bounds(canvas, x, y, raster.width(), raster.height())?;
        imageops::overlay(canvas, raster, i64::from(x), i64::from(y));
        Ok(())
    }

    /// Extracts a sub-rectangle of `canvas` and encodes it as PNG.
    fn crop_encode(
        &self,
        canvas: &RgbaImage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>> {
        check_bounds(canvas, x, y, width, height)?;
        let region = imageops::crop_imm(canvas, x, y, width, height).to_image();
        Ok(encode_png(&region)?)
    }
}

fn check_bounds(canvas: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> Result<()> {
    let fits_x = x.checked_add(width).is_some_and(|right| right <= canvas.width());
    let fits_y = y.checked_add(height).is_some_and(|bottom| bottom <= canvas.height());
    if width == 0 || height == 0 || !fits_x || !fits_y {
        return Err(RenderError::Geometry(format!(
            "{width}x{height} at ({x}, {y}) outside {}x{} canvas",
            canvas.width(),
            canvas.height()
        )));
    }
    Ok(())
}

static SYSTEM_FONTS: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
});

/// `image` + `resvg` backend. Text is shaped with the system fonts, which are
/// loaded once per process and shared read-only between renders.
#[derive(Clone)]
pub struct ResvgBackend {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl ResvgBackend {
    pub fn new() -> Self {
        Self {
            fontdb: Arc::clone(&SYSTEM_FONTS),
        }
    }

    /// Uses a caller-provided font database instead of the system fonts.
    pub fn with_fonts(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { fontdb }
    }
}

impl Default for ResvgBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResvgBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResvgBackend")
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl RasterBackend for ResvgBackend {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage> {
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_data(svg.as_bytes(), &options)?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            RenderError::Canvas(format!("cannot allocate {width}x{height} pixmap"))
        })?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        let mut canvas = RgbaImage::new(width, height);
        for (dst, src) in canvas.pixels_mut().zip(pixmap.pixels()) {
            let color = src.demultiply();
            *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
        }
        Ok(canvas)
    }
}
