//! Fixed layout of the two-dial canvas. These values must match the
//! hardware exactly and are never changed at runtime.

pub const CANVAS_WIDTH: u32 = 400;
pub const CANVAS_HEIGHT: u32 = 100;
pub const REGION_WIDTH: u32 = CANVAS_WIDTH / 2;
pub const ARTWORK_SIZE: u32 = CANVAS_HEIGHT;
pub const PADDING: u32 = 8;

pub const TEXT_X: u32 = ARTWORK_SIZE + PADDING;
pub const TEXT_COLUMN_WIDTH: u32 = CANVAS_WIDTH - TEXT_X - PADDING;

pub const TITLE_FONT_SIZE: f32 = 18.0;
pub const TITLE_BASELINE: u32 = 36;
pub const TITLE_MAX_CHARS: usize = 28;

pub const ARTIST_FONT_SIZE: f32 = 14.0;
pub const ARTIST_BASELINE: u32 = 60;
pub const ARTIST_MAX_CHARS: usize = 34;

pub const BAR_X: u32 = TEXT_X;
pub const BAR_WIDTH: u32 = TEXT_COLUMN_WIDTH;
pub const BAR_HEIGHT: u32 = 5;
pub const BAR_RADIUS: u32 = 1;
pub const BAR_Y: u32 = CANVAS_HEIGHT - PADDING - BAR_HEIGHT;
