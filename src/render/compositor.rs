use image::RgbaImage;

use super::backend::RasterBackend;
use super::geometry::{CANVAS_HEIGHT, CANVAS_WIDTH, REGION_WIDTH};
use super::payload::ImagePayload;
use super::scene::Scene;
use crate::error::Result;
use crate::palette::Palette;
use crate::snapshot::Region;

/// Builds the full two-dial canvas: the scene is rasterized first, then the
/// decoded art (if any) is laid over the artwork square.
pub fn compose_canvas<B: RasterBackend + ?Sized>(
    backend: &B,
    palette: &Palette,
    art: Option<&RgbaImage>,
    scene: &Scene,
) -> Result<RgbaImage> {
    let svg = scene.to_svg(palette);
    let mut canvas = backend.rasterize(&svg, CANVAS_WIDTH, CANVAS_HEIGHT)?;
    if let Some(art) = art {
        backend.place(&mut canvas, art, 0, 0)?;
    }
    Ok(canvas)
}

/// Cuts `region` out of a full canvas and wraps it as a PNG data URI.
pub fn extract_region<B: RasterBackend + ?Sized>(
    backend: &B,
    canvas: &RgbaImage,
    region: Region,
) -> Result<ImagePayload> {
    let png = backend.crop_encode(canvas, region.x_offset(), 0, REGION_WIDTH, CANVAS_HEIGHT)?;
    Ok(ImagePayload::from_png(&png))
}

pub fn compose<B: RasterBackend + ?Sized>(
    backend: &B,
    palette: &Palette,
    art: Option<&RgbaImage>,
    scene: &Scene,
    region: Region,
) -> Result<ImagePayload> {
    let canvas = compose_canvas(backend, palette, art, scene)?;
    extract_region(backend, &canvas, region)
}
