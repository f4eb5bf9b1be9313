//! Errors raised inside the composition pipeline.
//!
//! None of these cross the [`crate::Renderer`] boundary: every public render
//! entry point converts them into the fallback image.

/// Result alias for compositing operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The generated scene markup could not be parsed.
    #[error("failed to parse scene markup: {0}")]
    Svg(#[from] resvg::usvg::Error),

    /// A raster could not be allocated or converted.
    #[error("canvas error: {0}")]
    Canvas(String),

    /// PNG encoding failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// A placement or crop fell outside the canvas.
    #[error("geometry error: {0}")]
    Geometry(String),
}
