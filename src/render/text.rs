use quick_xml::escape::escape;

use super::geometry::{
    ARTIST_BASELINE, ARTIST_FONT_SIZE, TEXT_X, TITLE_BASELINE, TITLE_FONT_SIZE,
};
use crate::snapshot::{join_artists, UNKNOWN_TRACK};

pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Artist,
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrimitive {
    /// Truncated display text.
    pub text: String,
    /// `text` escaped for embedding in markup.
    pub markup: String,
    pub x: u32,
    pub baseline: u32,
    pub font_size: f32,
    pub role: TextRole,
}

impl TextPrimitive {
    fn new(text: String, role: TextRole) -> Self {
        let (baseline, font_size) = match role {
            TextRole::Title => (TITLE_BASELINE, TITLE_FONT_SIZE),
            TextRole::Artist => (ARTIST_BASELINE, ARTIST_FONT_SIZE),
        };
        let markup = escape(text.as_str()).into_owned();
        Self {
            text,
            markup,
            x: TEXT_X,
            baseline,
            font_size,
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub title: TextPrimitive,
    pub artist: TextPrimitive,
}

pub fn layout_text(
    title: Option<&str>,
    artists: &[String],
    max_title_chars: usize,
    max_artist_chars: usize,
) -> TextLayout {
    let title = title
        .map(single_line)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNKNOWN_TRACK.to_string());
    let artist = single_line(&join_artists(artists));

    TextLayout {
        title: TextPrimitive::new(truncate(&title, max_title_chars), TextRole::Title),
        artist: TextPrimitive::new(truncate(&artist, max_artist_chars), TextRole::Artist),
    }
}

/// Shortens `text` to at most `budget` characters, ending in "..." when cut.
pub fn truncate(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let keep = budget.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    if budget < ELLIPSIS.len() {
        out.truncate(budget);
    }
    out
}

// Metadata sometimes carries newlines or tabs; the dial shows one line each.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
