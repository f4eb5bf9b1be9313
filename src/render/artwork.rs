use std::borrow::Cow;

use base64::Engine;
use image::{imageops::FilterType, RgbaImage};
use tracing::debug;

const DATA_URL_PREFIX: &[u8] = b"data:";
const BASE64_MARKER: &[u8] = b";base64";

/// Decodes album art of any supported format and center-crops it to a
/// `size × size` square. Returns `None` for missing or undecodable input.
pub fn decode_and_square(bytes: Option<&[u8]>, size: u32) -> Option<RgbaImage> {
    let bytes = bytes.filter(|bytes| !bytes.is_empty())?;

    let payload = match unwrap_data_url(bytes) {
        Ok(payload) => payload,
        Err(err) => {
            debug!(error = %err, "discarding artwork data URL");
            return None;
        }
    };

    let image = match image::load_from_memory(&payload) {
        Ok(image) => image,
        Err(err) => {
            debug!(error = %err, len = payload.len(), "failed to decode artwork");
            return None;
        }
    };

    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 || size == 0 {
        return None;
    }

    // Crop before scaling so thin strips never grow a huge intermediate.
    let side = width.min(height);
    let square = image.crop_imm((width - side) / 2, (height - side) / 2, side, side);
    Some(
        square
            .resize_exact(size, size, FilterType::Lanczos3)
            .to_rgba8(),
    )
}

/// Strips a `data:<mime>[;base64],` wrapper, decoding base64 payloads.
/// Bytes without the prefix pass through untouched.
fn unwrap_data_url(bytes: &[u8]) -> Result<Cow<'_, [u8]>, base64::DecodeError> {
    let trimmed = bytes.trim_ascii_start();
    let has_prefix = trimmed.len() >= DATA_URL_PREFIX.len()
        && trimmed[..DATA_URL_PREFIX.len()].eq_ignore_ascii_case(DATA_URL_PREFIX);
    if !has_prefix {
        return Ok(Cow::Borrowed(bytes));
    }

    let Some(comma) = trimmed.iter().position(|b| *b == b',') else {
        return Ok(Cow::Owned(Vec::new()));
    };
    let (header, payload) = (&trimmed[..comma], &trimmed[comma + 1..]);

    let is_base64 = header.len() >= BASE64_MARKER.len()
        && header[header.len() - BASE64_MARKER.len()..].eq_ignore_ascii_case(BASE64_MARKER);
    if !is_base64 {
        return Ok(Cow::Borrowed(payload));
    }

    let compact: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map(Cow::Owned)
}
