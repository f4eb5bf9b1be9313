//! Now-playing mirror for dial/LCD hardware.
//!
//! The heart of the crate is [`render::Renderer`], a stateless composition
//! engine that turns a [`TrackSnapshot`] into a 400×100 canvas split across two
//! 200×100 dial regions. [`plugin::DialController`] wires it to a display and a
//! media session, and [`session::SnapshotWorker`] polls the media session off
//! the caller's thread.

pub mod config;
pub mod error;
pub mod palette;
pub mod plugin;
pub mod render;
pub mod session;
pub mod snapshot;

pub use config::{Config, ControlsConfig};
pub use error::{RenderError, Result};
pub use palette::{Color, Palette};
pub use render::{ImagePayload, RasterBackend, Renderer, ResvgBackend};
pub use snapshot::{Region, TrackSnapshot};
