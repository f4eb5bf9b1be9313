use image::{Rgba, RgbaImage};
use tracing::error;

use super::geometry::{BAR_HEIGHT, BAR_Y, CANVAS_HEIGHT, PADDING, REGION_WIDTH};
use super::payload::{encode_png, ImagePayload};
use crate::palette::Palette;
use crate::snapshot::Region;

const GLYPH_BAR_WIDTH: u32 = 10;
const GLYPH_BAR_HEIGHT: u32 = 40;
const GLYPH_GAP: u32 = 12;

/// Draws the degraded image pixel by pixel. No markup, fonts or artwork are
/// involved, so this cannot fail for the reasons the full pipeline can.
pub fn draw_fallback(palette: &Palette, region: Region) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(REGION_WIDTH, CANVAS_HEIGHT, palette.background.to_rgba());

    match region {
        Region::Left => {
            let glyph = palette.placeholder_glyph.opaque().to_rgba();
            let total = GLYPH_BAR_WIDTH * 2 + GLYPH_GAP;
            let x = (REGION_WIDTH - total) / 2;
            let y = (CANVAS_HEIGHT - GLYPH_BAR_HEIGHT) / 2;
            fill_rect(&mut image, x, y, GLYPH_BAR_WIDTH, GLYPH_BAR_HEIGHT, glyph);
            fill_rect(
                &mut image,
                x + GLYPH_BAR_WIDTH + GLYPH_GAP,
                y,
                GLYPH_BAR_WIDTH,
                GLYPH_BAR_HEIGHT,
                glyph,
            );
        }
        Region::Right => {
            let track = palette.progress_track.opaque().to_rgba();
            fill_rect(
                &mut image,
                PADDING,
                BAR_Y,
                REGION_WIDTH - PADDING * 2,
                BAR_HEIGHT,
                track,
            );
        }
    }

    image
}

pub fn encode_fallback(image: &RgbaImage) -> ImagePayload {
    match encode_png(image) {
        Ok(png) => ImagePayload::from_png(&png),
        Err(err) => {
            error!(error = %err, "failed to encode fallback image");
            ImagePayload::empty_png()
        }
    }
}

fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let right = (x + width).min(image.width());
    let bottom = (y + height).min(image.height());
    for py in y..bottom {
        for px in x..right {
            image.put_pixel(px, py, color);
        }
    }
}
