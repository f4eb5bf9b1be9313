use super::geometry::{BAR_HEIGHT, BAR_RADIUS, BAR_X, BAR_Y};
use crate::snapshot::usable_duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub radius: u32,
}

impl BarRect {
    fn at_origin(width: u32) -> Self {
        Self {
            x: BAR_X,
            y: BAR_Y,
            width,
            height: BAR_HEIGHT,
            radius: BAR_RADIUS,
        }
    }
}

/// Background track plus the optional filled portion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBar {
    pub track: BarRect,
    pub fill: Option<BarRect>,
}

impl ProgressBar {
    pub fn empty(bar_width: u32) -> Self {
        Self {
            track: BarRect::at_origin(bar_width),
            fill: None,
        }
    }

    pub fn fill_width(&self) -> u32 {
        self.fill.map_or(0, |fill| fill.width)
    }
}

/// Filled width for `position` out of `duration`, or `None` when there is no
/// usable duration.
pub fn fill_width(duration: Option<f64>, position: Option<f64>, bar_width: u32) -> Option<u32> {
    let duration = usable_duration(duration)?;
    let position = position.filter(|secs| secs.is_finite()).unwrap_or(0.0);
    let ratio = (position / duration).clamp(0.0, 1.0);
    Some((bar_width as f64 * ratio).round() as u32)
}

pub fn build_progress_bar(
    duration: Option<f64>,
    position: Option<f64>,
    bar_width: u32,
) -> ProgressBar {
    let mut bar = ProgressBar::empty(bar_width);
    bar.fill = fill_width(duration, position, bar_width)
        .filter(|width| *width > 0)
        .map(BarRect::at_origin);
    bar
}
