//! Composition engine for the two-dial LCD strip.
//!
//! Every call composes the full 400×100 canvas from scratch and returns the
//! requested 200×100 half, so the two physical dials always line up even
//! though they are updated independently.

pub mod artwork;
pub mod backend;
pub mod compositor;
pub mod fallback;
pub mod geometry;
pub mod payload;
pub mod progress;
pub mod scene;
pub mod text;

use image::RgbaImage;
use tracing::warn;

pub use backend::{RasterBackend, ResvgBackend};
pub use payload::ImagePayload;

use crate::error::Result;
use crate::palette::Palette;
use crate::snapshot::{Region, TrackSnapshot};
use geometry::{ARTIST_MAX_CHARS, ARTWORK_SIZE, BAR_WIDTH, TITLE_MAX_CHARS};
use progress::{build_progress_bar, ProgressBar};
use scene::{ArtSlot, Scene};
use text::layout_text;

pub const IDLE_TITLE: &str = "No track playing";
pub const IDLE_SUBTITLE: &str = "Start playing music";

/// Stateless renderer: output depends only on the arguments and the palette.
#[derive(Debug, Clone)]
pub struct Renderer<B = ResvgBackend> {
    backend: B,
    palette: Palette,
}

impl Renderer<ResvgBackend> {
    pub fn new(palette: Palette) -> Self {
        Self::with_backend(ResvgBackend::new(), palette)
    }
}

impl Default for Renderer<ResvgBackend> {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}

impl<B: RasterBackend> Renderer<B> {
    pub fn with_backend(backend: B, palette: Palette) -> Self {
        Self { backend, palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Now-playing view for a playing snapshot, idle view otherwise.
    pub fn render(&self, snapshot: Option<&TrackSnapshot>, region: Region) -> ImagePayload {
        match snapshot {
            Some(snapshot) if snapshot.is_playing => self.render_now_playing(snapshot, region),
            _ => self.render_idle(region),
        }
    }

    pub fn render_now_playing(&self, snapshot: &TrackSnapshot, region: Region) -> ImagePayload {
        match self.try_render_now_playing(snapshot, region) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%region, error = %err, "now-playing render failed; using fallback");
                self.render_fallback(region)
            }
        }
    }

    pub fn render_idle(&self, region: Region) -> ImagePayload {
        let scene = idle_scene();
        match compositor::compose(&self.backend, &self.palette, None, &scene, region) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%region, error = %err, "idle render failed; using fallback");
                self.render_fallback(region)
            }
        }
    }

    /// Minimal placeholder used when the full pipeline fails. Never touches
    /// the snapshot, the artwork decoder or the raster backend.
    pub fn render_fallback(&self, region: Region) -> ImagePayload {
        fallback::encode_fallback(&fallback::draw_fallback(&self.palette, region))
    }

    /// Renders several regions of one snapshot from a single composed canvas,
    /// so the art is decoded and the scene rasterized once per call.
    pub fn render_regions(
        &self,
        snapshot: Option<&TrackSnapshot>,
        regions: &[Region],
    ) -> Vec<(Region, ImagePayload)> {
        let canvas = match snapshot {
            Some(snapshot) if snapshot.is_playing => self.now_playing_canvas(snapshot),
            _ => self.idle_canvas(),
        };
        if let Err(err) = &canvas {
            warn!(error = %err, "canvas render failed; using fallback");
        }

        regions
            .iter()
            .map(|&region| {
                let payload = canvas
                    .as_ref()
                    .ok()
                    .and_then(|canvas| {
                        compositor::extract_region(&self.backend, canvas, region)
                            .map_err(|err| warn!(%region, error = %err, "region extract failed"))
                            .ok()
                    })
                    .unwrap_or_else(|| self.render_fallback(region));
                (region, payload)
            })
            .collect()
    }

    /// The full two-dial canvas for `snapshot`, before any region is cut out.
    pub fn now_playing_canvas(&self, snapshot: &TrackSnapshot) -> Result<RgbaImage> {
        let (art, scene) = self.now_playing_scene(snapshot);
        compositor::compose_canvas(&self.backend, &self.palette, art.as_ref(), &scene)
    }

    fn idle_canvas(&self) -> Result<RgbaImage> {
        compositor::compose_canvas(&self.backend, &self.palette, None, &idle_scene())
    }

    fn try_render_now_playing(
        &self,
        snapshot: &TrackSnapshot,
        region: Region,
    ) -> Result<ImagePayload> {
        let canvas = self.now_playing_canvas(snapshot)?;
        compositor::extract_region(&self.backend, &canvas, region)
    }

    fn now_playing_scene(&self, snapshot: &TrackSnapshot) -> (Option<RgbaImage>, Scene) {
        let art = snapshot
            .artwork
            .as_deref()
            .and_then(|bytes| self.backend.decode_art(bytes, ARTWORK_SIZE));
        let text = layout_text(
            snapshot.title.as_deref(),
            &snapshot.artists,
            TITLE_MAX_CHARS,
            ARTIST_MAX_CHARS,
        );
        let bar = build_progress_bar(snapshot.duration_secs, snapshot.position_secs, BAR_WIDTH);
        let scene = Scene {
            art: if art.is_some() {
                ArtSlot::Raster
            } else {
                ArtSlot::Placeholder
            },
            text,
            bar,
        };
        (art, scene)
    }
}

fn idle_scene() -> Scene {
    Scene {
        art: ArtSlot::Idle,
        text: layout_text(
            Some(IDLE_TITLE),
            &[IDLE_SUBTITLE.to_string()],
            TITLE_MAX_CHARS,
            ARTIST_MAX_CHARS,
        ),
        bar: ProgressBar::empty(BAR_WIDTH),
    }
}
