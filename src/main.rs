use anyhow::{bail, Context, Result};
use nowplaying_dial::{
    plugin::{ContextId, DisplaySink},
    Config, ImagePayload, Region, Renderer, TrackSnapshot,
};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: nowplaying-dial [render] [snapshot.toml] [out-dir]\n       nowplaying-dial watch [out-dir]   (Windows only)";

#[derive(Debug, Default, Deserialize)]
struct SnapshotDocument {
    title: Option<String>,
    #[serde(default)]
    artists: Vec<String>,
    album: Option<String>,
    /// Image file, relative to the snapshot file.
    artwork: Option<PathBuf>,
    duration_secs: Option<f64>,
    position_secs: Option<f64>,
    #[serde(default)]
    playing: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    for warning in &config.warnings {
        warn!("config: {warning}");
    }

    let mut args: Vec<String> = env::args().skip(1).collect();
    let command = match args.first().map(String::as_str) {
        Some("render") | Some("watch") => args.remove(0),
        Some("-h") | Some("--help") => {
            println!("{USAGE}");
            return Ok(());
        }
        _ => "render".to_string(),
    };

    match command.as_str() {
        "watch" => watch(config, out_dir(args.first())),
        _ => render(config, args.first().map(PathBuf::from), out_dir(args.get(1))),
    }
}

fn out_dir(arg: Option<&String>) -> PathBuf {
    arg.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

fn render(config: Config, snapshot_path: Option<PathBuf>, out_dir: PathBuf) -> Result<()> {
    let snapshot = snapshot_path
        .as_deref()
        .map(load_snapshot)
        .transpose()?;
    let renderer = Renderer::new(config.palette);

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    for region in Region::ALL {
        let dial = renderer.render(snapshot.as_ref(), region);
        write_payload(&out_dir.join(format!("dial-{region}.png")), &dial)?;
        let fallback = renderer.render_fallback(region);
        write_payload(&out_dir.join(format!("fallback-{region}.png")), &fallback)?;
    }

    info!(out = %out_dir.display(), "wrote dial previews");
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<TrackSnapshot> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let doc: SnapshotDocument = toml::from_str(&data)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

    let artwork = match doc.artwork {
        Some(art) => {
            let art_path = path.parent().unwrap_or_else(|| Path::new(".")).join(art);
            let bytes = fs::read(&art_path)
                .with_context(|| format!("Failed to read artwork: {}", art_path.display()))?;
            Some(bytes)
        }
        None => None,
    };

    Ok(TrackSnapshot {
        title: doc.title,
        artists: doc.artists,
        album: doc.album,
        artwork,
        duration_secs: doc.duration_secs,
        position_secs: doc.position_secs,
        is_playing: doc.playing,
    })
}

fn write_payload(path: &Path, payload: &ImagePayload) -> Result<()> {
    let Some(png) = payload.png_bytes() else {
        bail!("Rendered payload for {} carries no image", path.display());
    };
    fs::write(path, png).with_context(|| format!("Failed to write image: {}", path.display()))
}

/// Stands in for the hardware: dial images become `<context>.png` files and
/// key titles go to the log.
#[cfg_attr(not(windows), allow(dead_code))]
struct FileDisplay {
    out_dir: PathBuf,
}

impl DisplaySink for FileDisplay {
    fn set_title(&mut self, context: &ContextId, title: &str) -> Result<()> {
        info!(%context, title = %title.replace('\n', " / "), "key title");
        Ok(())
    }

    fn set_feedback_image(&mut self, context: &ContextId, image: &ImagePayload) -> Result<()> {
        write_payload(&self.out_dir.join(format!("{context}.png")), image)
    }
}

#[cfg(windows)]
fn watch(config: Config, out_dir: PathBuf) -> Result<()> {
    use nowplaying_dial::plugin::{DeviceEvent, DialController, DialSettings};
    use nowplaying_dial::session::{SnapshotWorker, WindowsMediaSession, WorkerPoll};

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let poll_interval = config.controls.poll_interval;
    let media = WindowsMediaSession::new()?;
    let display = FileDisplay { out_dir };
    let mut controller =
        DialController::new(Renderer::new(config.palette), display, media, config.controls);

    for region in Region::ALL {
        controller.handle_device_event(DeviceEvent::DialAppeared {
            context: ContextId::new(format!("dial-{region}")),
            settings: DialSettings { region },
        });
    }
    controller.handle_device_event(DeviceEvent::KeyAppeared {
        context: ContextId::new("key"),
    });

    let mut worker = SnapshotWorker::spawn(WindowsMediaSession::new);
    info!(interval_ms = poll_interval.as_millis() as u64, "watching media session");
    loop {
        match worker.poll(poll_interval * 4) {
            WorkerPoll::Ready(Ok(snapshot)) => controller.update_snapshot(snapshot),
            WorkerPoll::Ready(Err(err)) => {
                warn!(error = %format!("{err:#}"), "snapshot fetch failed")
            }
            WorkerPoll::Pending => warn!("snapshot fetch timed out"),
            WorkerPoll::Stopped => break,
        }
        std::thread::sleep(poll_interval);
    }

    bail!("media session worker exited")
}

#[cfg(not(windows))]
fn watch(_config: Config, _out_dir: PathBuf) -> Result<()> {
    bail!("watch needs the Windows media session; use `render` on this platform")
}
