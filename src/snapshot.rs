use serde::Deserialize;

use crate::render::geometry::REGION_WIDTH;

pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Media state at one point in time, as reported by the media session.
///
/// Renderers only ever borrow a snapshot, so a producer that wants to keep
/// updating its own copy should hand out clones (or an `Arc`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSnapshot {
    pub title: Option<String>,
    pub artists: Vec<String>,
    pub album: Option<String>,
    /// Encoded artwork, or the bytes of a `data:` URL wrapping it.
    pub artwork: Option<Vec<u8>>,
    pub duration_secs: Option<f64>,
    pub position_secs: Option<f64>,
    pub is_playing: bool,
}

impl TrackSnapshot {
    /// Title with surrounding whitespace removed, or the placeholder.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(UNKNOWN_TRACK)
    }

    pub fn display_artists(&self) -> String {
        join_artists(&self.artists)
    }

    pub fn has_album(&self) -> bool {
        self.album
            .as_deref()
            .is_some_and(|album| !album.trim().is_empty())
    }

    /// Duration when it can drive a progress bar.
    pub fn usable_duration(&self) -> Option<f64> {
        usable_duration(self.duration_secs)
    }
}

/// Joins artist names with ", ", skipping blank entries.
pub fn join_artists(artists: &[String]) -> String {
    let joined = artists
        .iter()
        .map(|artist| artist.trim())
        .filter(|artist| !artist.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        UNKNOWN_ARTIST.to_string()
    } else {
        joined
    }
}

pub(crate) fn usable_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|secs| secs.is_finite() && *secs > 0.0)
}

/// Which half of the composed canvas a dial shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Left,
    Right,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Left, Region::Right];

    /// Horizontal offset of this region inside the full canvas.
    pub fn x_offset(self) -> u32 {
        match self {
            Region::Left => 0,
            Region::Right => REGION_WIDTH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Left => "left",
            Region::Right => "right",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
