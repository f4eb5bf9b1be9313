//! Media-session polling off the caller's thread.

#[cfg(windows)]
mod gsmtc;

#[cfg(windows)]
pub use gsmtc::WindowsMediaSession;

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{debug, warn};

use crate::snapshot::TrackSnapshot;

pub type SnapshotResult = anyhow::Result<Option<TrackSnapshot>>;

/// Something that can report what is playing right now. `Ok(None)` means no
/// media session is active.
pub trait SnapshotSource {
    fn fetch(&mut self) -> SnapshotResult;
}

enum SnapshotCommand {
    Fetch,
    Shutdown,
}

/// Outcome of one [`SnapshotWorker::poll`].
#[derive(Debug)]
pub enum WorkerPoll {
    /// The newest result that arrived; older ones were discarded.
    Ready(SnapshotResult),
    /// A fetch is still running. It is not requested again.
    Pending,
    /// The worker thread has exited.
    Stopped,
}

/// Background thread that fetches snapshots on request.
///
/// The source is built on the worker thread itself, since platform media
/// APIs often need per-thread initialisation.
pub struct SnapshotWorker {
    request_tx: Option<Sender<SnapshotCommand>>,
    result_rx: Receiver<SnapshotResult>,
    handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl SnapshotWorker {
    pub fn spawn<S, F>(make_source: F) -> Self
    where
        S: SnapshotSource,
        F: FnOnce() -> anyhow::Result<S> + Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::channel();
        let (request_tx, request_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut source = match make_source() {
                Ok(source) => source,
                Err(err) => {
                    let _ = result_tx.send(Err(err.context("media session unavailable")));
                    return;
                }
            };

            while let Ok(command) = request_rx.recv() {
                match command {
                    SnapshotCommand::Fetch => {
                        if result_tx.send(source.fetch()).is_err() {
                            break;
                        }
                    }
                    SnapshotCommand::Shutdown => break,
                }
            }
            debug!("snapshot worker stopped");
        });

        Self {
            request_tx: Some(request_tx),
            result_rx,
            handle: Some(handle),
            in_flight: 0,
        }
    }

    /// Asks for a fresh snapshot. Returns `false` once the worker has exited.
    pub fn request(&mut self) -> bool {
        let Some(tx) = self.request_tx.as_ref() else {
            return false;
        };
        if tx.send(SnapshotCommand::Fetch).is_ok() {
            self.in_flight += 1;
            true
        } else {
            warn!("snapshot worker is gone");
            self.request_tx = None;
            false
        }
    }

    /// Every result that has arrived so far, oldest first.
    pub fn drain(&mut self) -> Vec<SnapshotResult> {
        let mut results = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(result) => results.push(result),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<SnapshotResult> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// One polling step: requests a fetch unless one is still outstanding,
    /// waits up to `timeout`, and hands back only the newest result so a
    /// slow fetch never leaves the caller a poll behind.
    pub fn poll(&mut self, timeout: Duration) -> WorkerPoll {
        if self.in_flight == 0 && !self.request() {
            return self.drain().pop().map_or(WorkerPoll::Stopped, WorkerPoll::Ready);
        }

        match self.result_rx.recv_timeout(timeout) {
            Ok(first) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let newest = self.drain().pop().unwrap_or(first);
                WorkerPoll::Ready(newest)
            }
            Err(RecvTimeoutError::Timeout) => {
                debug!(in_flight = self.in_flight, "snapshot fetch still running");
                WorkerPoll::Pending
            }
            Err(RecvTimeoutError::Disconnected) => WorkerPoll::Stopped,
        }
    }
}

impl Drop for SnapshotWorker {
    fn drop(&mut self) {
        if let Some(tx) = self.request_tx.take() {
            let _ = tx.send(SnapshotCommand::Shutdown);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    struct Counting {
        calls: u32,
    }

    impl SnapshotSource for Counting {
        fn fetch(&mut self) -> SnapshotResult {
            self.calls += 1;
            Ok(Some(TrackSnapshot {
                title: Some(format!("Track {}", self.calls)),
                is_playing: true,
                ..Default::default()
            }))
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn fetches_on_request_in_order() {
        let mut worker = SnapshotWorker::spawn(|| Ok(Counting { calls: 0 }));
        assert!(worker.request());
        assert!(worker.request());

        let first = worker.recv_timeout(WAIT).unwrap().unwrap().unwrap();
        let second = worker.recv_timeout(WAIT).unwrap().unwrap().unwrap();
        assert_eq!(first.title.as_deref(), Some("Track 1"));
        assert_eq!(second.title.as_deref(), Some("Track 2"));
        assert!(worker.drain().is_empty());
    }

    #[test]
    fn source_setup_failure_is_reported_once() {
        let mut worker = SnapshotWorker::spawn(|| -> anyhow::Result<Counting> {
            Err(anyhow!("no session manager"))
        });
        let err = worker.recv_timeout(WAIT).unwrap().unwrap_err();
        assert!(format!("{err:#}").contains("no session manager"));

        // The thread has exited, so further requests eventually fail.
        let mut accepted = 0;
        while worker.request() {
            accepted += 1;
            thread::sleep(Duration::from_millis(10));
            assert!(accepted < 500, "worker never shut down");
        }
    }

    /// First fetch is slower than the poll timeout; later ones are quick.
    struct SlowStart {
        calls: Arc<AtomicU32>,
    }

    impl SnapshotSource for SlowStart {
        fn fetch(&mut self) -> SnapshotResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                thread::sleep(Duration::from_millis(300));
            }
            Ok(Some(TrackSnapshot {
                title: Some(format!("Track {call}")),
                is_playing: true,
                ..Default::default()
            }))
        }
    }

    fn title(poll: WorkerPoll) -> String {
        match poll {
            WorkerPoll::Ready(Ok(Some(snapshot))) => snapshot.title.unwrap_or_default(),
            other => panic!("expected a snapshot, got {other:?}"),
        }
    }

    #[test]
    fn slow_fetch_does_not_leave_polling_behind() {
        let calls = Arc::new(AtomicU32::new(0));
        let source_calls = Arc::clone(&calls);
        let mut worker = SnapshotWorker::spawn(move || Ok(SlowStart { calls: source_calls }));

        assert!(matches!(worker.poll(Duration::from_millis(50)), WorkerPoll::Pending));
        let mut waited = 0;
        let first = loop {
            match worker.poll(Duration::from_millis(50)) {
                WorkerPoll::Pending => {
                    waited += 1;
                    assert!(waited < 100, "first fetch never arrived");
                }
                ready => break ready,
            }
        };
        assert_eq!(title(first), "Track 1");
        // Polls during the slow fetch did not queue extra requests.
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(title(worker.poll(WAIT)), "Track 2");
        assert_eq!(title(worker.poll(WAIT)), "Track 3");
        assert!(worker.drain().is_empty());
    }

    #[test]
    fn poll_keeps_only_the_newest_result() {
        let mut worker = SnapshotWorker::spawn(|| Ok(Counting { calls: 0 }));
        assert!(worker.request());
        assert!(worker.request());
        thread::sleep(Duration::from_millis(200));
        assert_eq!(title(worker.poll(WAIT)), "Track 2");
    }

    #[test]
    fn poll_reports_setup_failure_then_stops() {
        let mut worker = SnapshotWorker::spawn(|| -> anyhow::Result<Counting> {
            Err(anyhow!("no session manager"))
        });
        match worker.poll(WAIT) {
            WorkerPoll::Ready(Err(err)) => assert!(format!("{err:#}").contains("no session manager")),
            other => panic!("expected the setup error, got {other:?}"),
        }
        let mut polls = 0;
        while !matches!(worker.poll(Duration::from_millis(10)), WorkerPoll::Stopped) {
            polls += 1;
            assert!(polls < 500, "worker never reported stopping");
        }
    }

    #[test]
    fn drop_stops_the_thread() {
        let worker = SnapshotWorker::spawn(|| Ok(Counting { calls: 0 }));
        drop(worker);
    }
}
