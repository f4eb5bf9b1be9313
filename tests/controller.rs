use std::sync::Arc;

use anyhow::anyhow;
use nowplaying_dial::plugin::{
    ContextId, DeviceEvent, DialController, DialSettings, DisplaySink, MediaControl,
    KEY_NOT_PLAYING,
};
use nowplaying_dial::{ControlsConfig, ImagePayload, Palette, Region, Renderer, ResvgBackend, TrackSnapshot};
use resvg::usvg::fontdb;

#[derive(Default)]
struct RecordingDisplay {
    titles: Vec<(ContextId, String)>,
    images: Vec<(ContextId, ImagePayload)>,
    reject: bool,
}

impl RecordingDisplay {
    fn last_image(&self, context: &str) -> Option<&ImagePayload> {
        self.images
            .iter()
            .rev()
            .find(|(ctx, _)| ctx.as_str() == context)
            .map(|(_, image)| image)
    }

    fn last_title(&self, context: &str) -> Option<&str> {
        self.titles
            .iter()
            .rev()
            .find(|(ctx, _)| ctx.as_str() == context)
            .map(|(_, title)| title.as_str())
    }
}

impl DisplaySink for RecordingDisplay {
    fn set_title(&mut self, context: &ContextId, title: &str) -> anyhow::Result<()> {
        self.titles.push((context.clone(), title.to_string()));
        if self.reject {
            return Err(anyhow!("device disconnected"));
        }
        Ok(())
    }

    fn set_feedback_image(
        &mut self,
        context: &ContextId,
        image: &ImagePayload,
    ) -> anyhow::Result<()> {
        self.images.push((context.clone(), image.clone()));
        if self.reject {
            return Err(anyhow!("device disconnected"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingMedia {
    toggles: u32,
    seeks: Vec<f64>,
    reject: bool,
}

impl MediaControl for RecordingMedia {
    fn toggle_play_pause(&mut self) -> anyhow::Result<()> {
        self.toggles += 1;
        if self.reject {
            return Err(anyhow!("no session"));
        }
        Ok(())
    }

    fn seek_by(&mut self, seconds: f64) -> anyhow::Result<()> {
        self.seeks.push(seconds);
        if self.reject {
            return Err(anyhow!("no session"));
        }
        Ok(())
    }
}

fn renderer() -> Renderer {
    Renderer::with_backend(
        ResvgBackend::with_fonts(Arc::new(fontdb::Database::new())),
        Palette::default(),
    )
}

fn controller(
    display: RecordingDisplay,
    media: RecordingMedia,
) -> DialController<RecordingDisplay, RecordingMedia> {
    DialController::new(renderer(), display, media, ControlsConfig::default())
}

fn dial(context: &str, region: Region) -> DeviceEvent {
    DeviceEvent::DialAppeared {
        context: ContextId::from(context),
        settings: DialSettings { region },
    }
}

fn playing() -> TrackSnapshot {
    TrackSnapshot {
        title: Some("Midnight City".into()),
        artists: vec!["M83".into()],
        duration_secs: Some(244.0),
        position_secs: Some(122.0),
        is_playing: true,
        ..Default::default()
    }
}

#[test]
fn new_dials_show_idle_until_a_track_arrives() {
    let mut controller = controller(RecordingDisplay::default(), RecordingMedia::default());
    controller.handle_device_event(dial("a", Region::Left));
    controller.handle_device_event(dial("b", Region::Right));

    let reference = renderer();
    assert_eq!(
        controller.display().last_image("a"),
        Some(&reference.render_idle(Region::Left))
    );
    assert_eq!(
        controller.display().last_image("b"),
        Some(&reference.render_idle(Region::Right))
    );
}

#[test]
fn snapshot_updates_repaint_every_target() {
    let mut controller = controller(RecordingDisplay::default(), RecordingMedia::default());
    controller.handle_device_event(dial("a", Region::Left));
    controller.handle_device_event(dial("b", Region::Right));
    controller.handle_device_event(DeviceEvent::KeyAppeared {
        context: ContextId::from("key"),
    });
    assert_eq!(controller.display().last_title("key"), Some(KEY_NOT_PLAYING));

    controller.update_snapshot(Some(playing()));

    let reference = renderer();
    assert_eq!(
        controller.display().last_image("a"),
        Some(&reference.render_now_playing(&playing(), Region::Left))
    );
    assert_eq!(
        controller.display().last_image("b"),
        Some(&reference.render_now_playing(&playing(), Region::Right))
    );
    assert_eq!(controller.display().last_title("key"), Some("Midnight ...\nM83"));

    controller.update_snapshot(None);
    assert_eq!(
        controller.display().last_image("a"),
        Some(&reference.render_idle(Region::Left))
    );
    assert_eq!(controller.display().last_title("key"), Some(KEY_NOT_PLAYING));
}

#[test]
fn settings_change_moves_a_dial_to_the_other_half() {
    let mut controller = controller(RecordingDisplay::default(), RecordingMedia::default());
    controller.update_snapshot(Some(playing()));
    controller.handle_device_event(dial("a", Region::Left));
    controller.handle_device_event(DeviceEvent::DialSettingsChanged {
        context: ContextId::from("a"),
        settings: DialSettings {
            region: Region::Right,
        },
    });

    assert_eq!(
        controller.dial_settings(&ContextId::from("a")),
        Some(DialSettings {
            region: Region::Right
        })
    );
    assert_eq!(
        controller.display().last_image("a"),
        Some(&renderer().render_now_playing(&playing(), Region::Right))
    );
}

#[test]
fn removed_targets_stop_receiving_updates() {
    let mut controller = controller(RecordingDisplay::default(), RecordingMedia::default());
    controller.handle_device_event(dial("a", Region::Left));
    controller.handle_device_event(DeviceEvent::DialDisappeared {
        context: ContextId::from("a"),
    });
    controller.handle_device_event(DeviceEvent::KeyAppeared {
        context: ContextId::from("key"),
    });
    controller.handle_device_event(DeviceEvent::KeyDisappeared {
        context: ContextId::from("key"),
    });
    let images_before = controller.display().images.len();
    let titles_before = controller.display().titles.len();

    controller.update_snapshot(Some(playing()));

    assert_eq!(controller.display().images.len(), images_before);
    assert_eq!(controller.display().titles.len(), titles_before);
    assert_eq!(controller.dial_settings(&ContextId::from("a")), None);
}

#[test]
fn rotation_seeks_by_configured_step() {
    let mut controller = DialController::new(
        renderer(),
        RecordingDisplay::default(),
        RecordingMedia::default(),
        ControlsConfig {
            seek_step_secs: 5.0,
            ..ControlsConfig::default()
        },
    );
    for ticks in [3, -2, 0] {
        controller.handle_device_event(DeviceEvent::DialRotate {
            context: ContextId::from("a"),
            ticks,
        });
    }
    assert_eq!(controller.media().seeks, vec![15.0, -10.0]);
}

#[test]
fn presses_and_touches_toggle_playback() {
    let mut controller = controller(RecordingDisplay::default(), RecordingMedia::default());
    let context = ContextId::from("a");
    controller.handle_device_event(DeviceEvent::DialPress {
        context: context.clone(),
    });
    controller.handle_device_event(DeviceEvent::DialTouch {
        context: context.clone(),
    });
    controller.handle_device_event(DeviceEvent::KeyPress { context });
    assert_eq!(controller.media().toggles, 3);
}

#[test]
fn transport_failures_are_dropped_not_fatal() {
    let display = RecordingDisplay {
        reject: true,
        ..Default::default()
    };
    let media = RecordingMedia {
        reject: true,
        ..Default::default()
    };
    let mut controller = controller(display, media);
    controller.handle_device_event(dial("a", Region::Left));
    controller.handle_device_event(dial("b", Region::Right));
    controller.update_snapshot(Some(playing()));
    controller.handle_device_event(DeviceEvent::DialPress {
        context: ContextId::from("a"),
    });
    controller.handle_device_event(DeviceEvent::DialRotate {
        context: ContextId::from("a"),
        ticks: 1,
    });

    // Both dials were attempted on every refresh despite the first failing.
    assert_eq!(controller.display().images.len(), 4);
    assert_eq!(controller.media().toggles, 1);
    assert_eq!(controller.media().seeks.len(), 1);
    assert!(controller.snapshot().is_some());
}
