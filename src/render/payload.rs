use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, RgbaImage};

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// A rendered dial image as a `data:image/png;base64,...` URI, the form the
/// display hardware accepts inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn from_png(png: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        Self(format!("{PNG_DATA_URI_PREFIX}{encoded}"))
    }

    /// A well-formed URI with no image data. Only used when even the fallback
    /// image cannot be encoded.
    pub fn empty_png() -> Self {
        Self(PNG_DATA_URI_PREFIX.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The PNG bytes carried by this payload.
    pub fn png_bytes(&self) -> Option<Vec<u8>> {
        let encoded = self.0.strip_prefix(PNG_DATA_URI_PREFIX)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok()
            .filter(|bytes| !bytes.is_empty())
    }

    /// Decodes the payload back into pixels.
    pub fn decode(&self) -> Option<RgbaImage> {
        let png = self.png_bytes()?;
        image::load_from_memory_with_format(&png, ImageFormat::Png)
            .ok()
            .map(|image| image.to_rgba8())
    }
}

impl AsRef<str> for ImagePayload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
