use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::{debug, info, warn};

use super::{ContextId, DeviceEvent, DialSettings, DisplaySink, MediaControl};
use crate::config::ControlsConfig;
use crate::render::text::truncate;
use crate::render::{ImagePayload, RasterBackend, Renderer, ResvgBackend};
use crate::snapshot::{Region, TrackSnapshot};

pub const KEY_LINE_MAX_CHARS: usize = 12;
pub const KEY_NOT_PLAYING: &str = "Not playing";

/// Owns the latest snapshot and the dial/key registry, and keeps every
/// registered target in sync with it.
pub struct DialController<D, M, B = ResvgBackend> {
    renderer: Renderer<B>,
    display: D,
    media: M,
    controls: ControlsConfig,
    snapshot: Option<Arc<TrackSnapshot>>,
    dials: HashMap<ContextId, DialSettings>,
    keys: HashSet<ContextId>,
}

impl<D, M, B> DialController<D, M, B>
where
    D: DisplaySink,
    M: MediaControl,
    B: RasterBackend,
{
    pub fn new(renderer: Renderer<B>, display: D, media: M, controls: ControlsConfig) -> Self {
        Self {
            renderer,
            display,
            media,
            controls,
            snapshot: None,
            dials: HashMap::new(),
            keys: HashSet::new(),
        }
    }

    pub fn snapshot(&self) -> Option<&TrackSnapshot> {
        self.snapshot.as_deref()
    }

    pub fn dial_settings(&self, context: &ContextId) -> Option<DialSettings> {
        self.dials.get(context).copied()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::DialAppeared { context, settings }
            | DeviceEvent::DialSettingsChanged { context, settings } => {
                debug!(%context, region = %settings.region, "dial registered");
                self.dials.insert(context.clone(), settings);
                let image = self.render_region(settings.region);
                self.push_image(&context, &image);
            }
            DeviceEvent::DialDisappeared { context } => {
                self.dials.remove(&context);
            }
            DeviceEvent::KeyAppeared { context } => {
                self.keys.insert(context.clone());
                let title = key_title(self.snapshot());
                self.push_title(&context, &title);
            }
            DeviceEvent::KeyDisappeared { context } => {
                self.keys.remove(&context);
            }
            DeviceEvent::DialRotate { context, ticks } => {
                if ticks == 0 {
                    return;
                }
                let seconds = f64::from(ticks) * self.controls.seek_step_secs;
                debug!(%context, ticks, seconds, "seek");
                if let Err(err) = self.media.seek_by(seconds) {
                    warn!(%context, error = %err, "seek failed");
                }
            }
            DeviceEvent::DialPress { context }
            | DeviceEvent::DialTouch { context }
            | DeviceEvent::KeyPress { context } => {
                if let Err(err) = self.media.toggle_play_pause() {
                    warn!(%context, error = %err, "play/pause failed");
                }
            }
        }
    }

    /// Replaces the current snapshot and repaints every target.
    pub fn update_snapshot(&mut self, snapshot: Option<TrackSnapshot>) {
        let changed_track = match (self.snapshot(), snapshot.as_ref()) {
            (Some(old), Some(new)) => old.title != new.title || old.artists != new.artists,
            (None, None) => false,
            _ => true,
        };
        if changed_track {
            match snapshot.as_ref() {
                Some(new) => {
                    let album = match new.album.as_deref() {
                        Some(album) if new.has_album() => album.trim(),
                        _ => "-",
                    };
                    info!(
                        title = new.display_title(),
                        artists = %new.display_artists(),
                        album,
                        "track changed"
                    );
                }
                None => info!("media session cleared"),
            }
        }
        self.snapshot = snapshot.map(Arc::new);
        self.refresh();
    }

    /// Re-renders every registered dial and retitles every key. Each region
    /// in use is cut from one shared canvas.
    pub fn refresh(&mut self) {
        let snapshot = self.snapshot.clone();

        let dials: Vec<(ContextId, DialSettings)> = self
            .dials
            .iter()
            .map(|(context, settings)| (context.clone(), *settings))
            .collect();
        let regions: Vec<Region> = Region::ALL
            .into_iter()
            .filter(|region| dials.iter().any(|(_, settings)| settings.region == *region))
            .collect();
        let rendered: HashMap<Region, ImagePayload> = self
            .renderer
            .render_regions(snapshot.as_deref(), &regions)
            .into_iter()
            .collect();
        for (context, settings) in dials {
            if let Some(image) = rendered.get(&settings.region) {
                self.push_image(&context, image);
            }
        }

        let title = key_title(snapshot.as_deref());
        let keys: Vec<ContextId> = self.keys.iter().cloned().collect();
        for context in keys {
            self.push_title(&context, &title);
        }
    }

    fn render_region(&self, region: Region) -> ImagePayload {
        self.renderer.render(self.snapshot(), region)
    }

    fn push_image(&mut self, context: &ContextId, image: &ImagePayload) {
        if let Err(err) = self.display.set_feedback_image(context, image) {
            warn!(%context, error = %err, "dropping dial update");
        }
    }

    fn push_title(&mut self, context: &ContextId, title: &str) {
        if let Err(err) = self.display.set_title(context, title) {
            warn!(%context, error = %err, "dropping key update");
        }
    }
}

/// Two-line key label: title over artists, or a not-playing notice.
pub fn key_title(snapshot: Option<&TrackSnapshot>) -> String {
    match snapshot {
        Some(snapshot) if snapshot.is_playing => format!(
            "{}\n{}",
            truncate(snapshot.display_title(), KEY_LINE_MAX_CHARS),
            truncate(&snapshot.display_artists(), KEY_LINE_MAX_CHARS)
        ),
        _ => KEY_NOT_PLAYING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_title_truncates_each_line() {
        let snapshot = TrackSnapshot {
            title: Some("Hurry Up, We're Dreaming".into()),
            artists: vec!["M83".into()],
            is_playing: true,
            ..Default::default()
        };
        assert_eq!(key_title(Some(&snapshot)), "Hurry Up,...\nM83");
    }

    #[test]
    fn key_title_when_idle() {
        assert_eq!(key_title(None), KEY_NOT_PLAYING);
        let paused = TrackSnapshot {
            title: Some("Midnight City".into()),
            ..Default::default()
        };
        assert_eq!(key_title(Some(&paused)), KEY_NOT_PLAYING);
    }
}
