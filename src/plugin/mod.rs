//! Glue between the hardware SDK, the media session and the renderer.

mod controller;

pub use controller::{key_title, DialController, KEY_LINE_MAX_CHARS, KEY_NOT_PLAYING};

use serde::Deserialize;

use crate::render::ImagePayload;
use crate::snapshot::Region;

/// Opaque identifier the hardware SDK assigns to one key or dial instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(String);

impl ContextId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-dial settings as stored by the hardware SDK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DialSettings {
    #[serde(default, alias = "position")]
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    DialAppeared {
        context: ContextId,
        settings: DialSettings,
    },
    DialSettingsChanged {
        context: ContextId,
        settings: DialSettings,
    },
    DialDisappeared {
        context: ContextId,
    },
    /// Positive ticks turn clockwise.
    DialRotate {
        context: ContextId,
        ticks: i32,
    },
    DialPress {
        context: ContextId,
    },
    DialTouch {
        context: ContextId,
    },
    KeyAppeared {
        context: ContextId,
    },
    KeyDisappeared {
        context: ContextId,
    },
    KeyPress {
        context: ContextId,
    },
}

/// The hardware side: accepts titles for keys and images for dials.
pub trait DisplaySink {
    fn set_title(&mut self, context: &ContextId, title: &str) -> anyhow::Result<()>;

    fn set_feedback_image(&mut self, context: &ContextId, image: &ImagePayload)
        -> anyhow::Result<()>;
}

/// The OS media session's transport controls.
pub trait MediaControl {
    fn toggle_play_pause(&mut self) -> anyhow::Result<()>;

    /// Moves the playhead by `seconds`, negative to rewind.
    fn seek_by(&mut self, seconds: f64) -> anyhow::Result<()>;
}
