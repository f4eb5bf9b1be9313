//! Global System Media Transport Controls (GSMTC) session on Windows.

use std::future::IntoFuture;

use anyhow::{anyhow, Context};
use futures::executor::block_on;
use tracing::debug;
use windows::{
    core::Result as WinResult,
    Foundation::TimeSpan,
    Media::Control::{
        GlobalSystemMediaTransportControlsSession,
        GlobalSystemMediaTransportControlsSessionManager,
        GlobalSystemMediaTransportControlsSessionMediaProperties,
        GlobalSystemMediaTransportControlsSessionPlaybackStatus,
    },
    Storage::Streams::DataReader,
    Win32::{
        Foundation::RPC_E_CHANGED_MODE,
        System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED},
    },
};

use super::{SnapshotResult, SnapshotSource};
use crate::plugin::MediaControl;
use crate::snapshot::TrackSnapshot;

const TICKS_PER_SECOND: f64 = 10_000_000.0;
const MAX_THUMBNAIL_BYTES: u64 = 16 * 1024 * 1024;

/// The current GSMTC session, re-resolved on every call so player switches
/// are picked up. Create it on the thread that will use it.
pub struct WindowsMediaSession {
    com_initialized: bool,
}

impl WindowsMediaSession {
    pub fn new() -> anyhow::Result<Self> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        let com_initialized = if hr.is_ok() {
            true
        } else if hr == RPC_E_CHANGED_MODE {
            false
        } else {
            return Err(anyhow!("COM init failed: {hr:?}"));
        };
        Ok(Self { com_initialized })
    }
}

impl Drop for WindowsMediaSession {
    fn drop(&mut self) {
        if self.com_initialized {
            unsafe { CoUninitialize() };
        }
    }
}

impl SnapshotSource for WindowsMediaSession {
    fn fetch(&mut self) -> SnapshotResult {
        let session = match current_session() {
            Ok(session) => session,
            // No player has registered a session.
            Err(_) => return Ok(None),
        };
        fetch_session_snapshot(&session)
            .map(Some)
            .context("failed to read media session")
    }
}

impl MediaControl for WindowsMediaSession {
    fn toggle_play_pause(&mut self) -> anyhow::Result<()> {
        let session = current_session().context("no media session")?;
        let accepted = block_on_operation(session.TryTogglePlayPauseAsync()?)?;
        if !accepted {
            return Err(anyhow!("player rejected play/pause"));
        }
        Ok(())
    }

    fn seek_by(&mut self, seconds: f64) -> anyhow::Result<()> {
        let session = current_session().context("no media session")?;
        let timeline = session.GetTimelineProperties()?;
        let start = time_span_to_secs(timeline.StartTime()?);
        let end = time_span_to_secs(timeline.EndTime()?).max(start);
        let position = time_span_to_secs(timeline.Position()?);
        let target = (position + seconds).clamp(start, end);

        let accepted =
            block_on_operation(session.TryChangePlaybackPositionAsync(secs_to_ticks(target))?)?;
        if !accepted {
            return Err(anyhow!("player rejected seek to {target:.1}s"));
        }
        Ok(())
    }
}

fn block_on_operation<O, T>(operation: O) -> WinResult<T>
where
    O: IntoFuture<Output = WinResult<T>>,
{
    block_on(operation.into_future())
}

fn current_session() -> WinResult<GlobalSystemMediaTransportControlsSession> {
    let manager =
        block_on_operation(GlobalSystemMediaTransportControlsSessionManager::RequestAsync()?)?;
    manager.GetCurrentSession()
}

fn fetch_session_snapshot(
    session: &GlobalSystemMediaTransportControlsSession,
) -> WinResult<TrackSnapshot> {
    let props = block_on_operation(session.TryGetMediaPropertiesAsync()?)?;
    let status = session.GetPlaybackInfo()?.PlaybackStatus()?;

    let timeline = session.GetTimelineProperties()?;
    let mut start = time_span_to_secs(timeline.StartTime()?);
    let mut end = time_span_to_secs(timeline.EndTime()?);
    if end < start {
        std::mem::swap(&mut start, &mut end);
    }
    let position = time_span_to_secs(timeline.Position()?);

    let artist = props.Artist()?.to_string_lossy();
    let album = props.AlbumTitle()?.to_string_lossy();

    Ok(TrackSnapshot {
        title: non_empty(props.Title()?.to_string_lossy()),
        artists: split_artists(&artist),
        album: non_empty(album),
        artwork: read_thumbnail(&props).unwrap_or_else(|err| {
            debug!(error = %err, "thumbnail unavailable");
            None
        }),
        duration_secs: Some(end - start),
        position_secs: position.is_finite().then(|| position - start),
        is_playing: status == GlobalSystemMediaTransportControlsSessionPlaybackStatus::Playing,
    })
}

/// Reads the session's cover art in one sized load. Oversized or missing
/// thumbnails are treated as no art.
fn read_thumbnail(
    props: &GlobalSystemMediaTransportControlsSessionMediaProperties,
) -> WinResult<Option<Vec<u8>>> {
    let Ok(reference) = props.Thumbnail() else {
        return Ok(None);
    };
    let stream = block_on_operation(reference.OpenReadAsync()?)?;
    let size = stream.Size()?;
    if size == 0 || size > MAX_THUMBNAIL_BYTES {
        debug!(size, "skipping thumbnail");
        return Ok(None);
    }

    let reader = DataReader::CreateDataReader(&stream.GetInputStreamAt(0)?)?;
    let loaded = block_on_operation(reader.LoadAsync(size as u32)?)?;
    let mut bytes = vec![0u8; loaded as usize];
    reader.ReadBytes(&mut bytes)?;
    Ok((!bytes.is_empty()).then_some(bytes))
}

fn time_span_to_secs(span: TimeSpan) -> f64 {
    span.Duration as f64 / TICKS_PER_SECOND
}

// Float-to-int `as` saturates, and NaN becomes 0.
fn secs_to_ticks(seconds: f64) -> i64 {
    (seconds * TICKS_PER_SECOND).round() as i64
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// GSMTC reports every artist in one string.
fn split_artists(artist: &str) -> Vec<String> {
    artist
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_round_trip_and_saturate() {
        assert_eq!(secs_to_ticks(1.5), 15_000_000);
        assert_eq!(secs_to_ticks(f64::INFINITY), i64::MAX);
        assert_eq!(secs_to_ticks(f64::NEG_INFINITY), i64::MIN);
        assert_eq!(secs_to_ticks(f64::NAN), 0);
        assert_eq!(time_span_to_secs(TimeSpan { Duration: 20_000_000 }), 2.0);
    }

    #[test]
    fn artists_split_on_semicolons() {
        assert_eq!(split_artists("A; B ;"), vec!["A".to_string(), "B".to_string()]);
        assert!(split_artists("").is_empty());
    }
}
