//! Vector description of one full canvas, serialized as SVG for rasterization.

use std::fmt::Write;

use quick_xml::escape::escape;

use super::geometry::{ARTWORK_SIZE, CANVAS_HEIGHT, CANVAS_WIDTH, TEXT_COLUMN_WIDTH, TEXT_X};
use super::progress::{BarRect, ProgressBar};
use super::text::{TextLayout, TextPrimitive, TextRole};
use crate::palette::{Color, Palette};

/// What occupies the artwork square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtSlot {
    /// A decoded raster is composited over this square afterwards.
    Raster,
    /// Music-note placeholder for tracks without usable art.
    Placeholder,
    /// Muted pause glyph shown while nothing is playing.
    Idle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub art: ArtSlot,
    pub text: TextLayout,
    pub bar: ProgressBar,
}

impl Scene {
    pub fn to_svg(&self, palette: &Palette) -> String {
        let mut svg = String::with_capacity(2048);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CANVAS_WIDTH}" height="{CANVAS_HEIGHT}" viewBox="0 0 {CANVAS_WIDTH} {CANVAS_HEIGHT}">"#
        );
        let _ = write!(
            svg,
            r#"<defs><clipPath id="text-column"><rect x="{TEXT_X}" y="0" width="{TEXT_COLUMN_WIDTH}" height="{CANVAS_HEIGHT}"/></clipPath></defs>"#
        );
        push_rect(&mut svg, 0, 0, CANVAS_WIDTH, CANVAS_HEIGHT, 0, palette.background);
        push_art(&mut svg, self.art, palette);

        let family = font_family_attr(&palette.font_family);
        svg.push_str(r#"<g clip-path="url(#text-column)">"#);
        push_text(&mut svg, &self.text.title, &family, palette);
        push_text(&mut svg, &self.text.artist, &family, palette);
        svg.push_str("</g>");

        push_bar(&mut svg, &self.bar.track, palette.progress_track);
        if let Some(fill) = &self.bar.fill {
            push_bar(&mut svg, fill, palette.progress_fill);
        }

        svg.push_str("</svg>");
        svg
    }
}

fn push_art(svg: &mut String, art: ArtSlot, palette: &Palette) {
    push_rect(svg, 0, 0, ARTWORK_SIZE, ARTWORK_SIZE, 0, palette.placeholder_background);
    match art {
        ArtSlot::Raster => {}
        ArtSlot::Placeholder => {
            let fill = paint("fill", palette.accent);
            let _ = write!(
                svg,
                r#"<g {fill}><ellipse cx="40" cy="66" rx="11" ry="8"/><rect x="47" y="28" width="4" height="38"/><path d="M51 28 L66 33 L66 41 L51 36 Z"/></g>"#
            );
        }
        ArtSlot::Idle => {
            push_rect(svg, 36, 30, 10, 40, 2, palette.placeholder_glyph);
            push_rect(svg, 54, 30, 10, 40, 2, palette.placeholder_glyph);
        }
    }
}

fn push_text(svg: &mut String, text: &TextPrimitive, family: &str, palette: &Palette) {
    let (color, weight) = match text.role {
        TextRole::Title => (palette.text_primary, "700"),
        TextRole::Artist => (palette.text_secondary, "400"),
    };
    let _ = write!(
        svg,
        r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" {fill}>{content}</text>"#,
        x = text.x,
        y = text.baseline,
        size = text.font_size,
        fill = paint("fill", color),
        content = text.markup,
    );
}

fn push_bar(svg: &mut String, rect: &BarRect, color: Color) {
    push_rect(svg, rect.x, rect.y, rect.width, rect.height, rect.radius, color);
}

fn push_rect(svg: &mut String, x: u32, y: u32, width: u32, height: u32, radius: u32, color: Color) {
    let _ = write!(
        svg,
        r#"<rect x="{x}" y="{y}" width="{width}" height="{height}""#
    );
    if radius > 0 {
        let _ = write!(svg, r#" rx="{radius}" ry="{radius}""#);
    }
    let _ = write!(svg, " {}/>", paint("fill", color));
}

fn paint(attr: &str, color: Color) -> String {
    if color.a == 255 {
        format!(r#"{attr}="{}""#, color.hex())
    } else {
        format!(
            r#"{attr}="{}" {attr}-opacity="{:.3}""#,
            color.hex(),
            color.opacity()
        )
    }
}

fn font_family_attr(family: &str) -> String {
    format!("{}, sans-serif", escape(family))
}
