use crate::models::error::SError;
use crate::models::paths::GamePaths;
use crate::utils::file::FileUtils;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// `(archive name, is in the active directory)` for every archive on disk.
pub type Snapshot = BTreeSet<(String, bool)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(Snapshot),
}

/// Lists both mod directories. Unreadable directories contribute nothing.
pub fn snapshot(paths: &GamePaths) -> Snapshot {
    let mut snap = Snapshot::new();
    for enabled in [true, false] {
        match FileUtils::list_mod_archives(paths.dir_for(enabled)) {
            Ok(files) => snap.extend(files.into_iter().map(|f| (f.name, enabled))),
            Err(e) => debug!("watcher: cannot list {}: {e}", paths.dir_for(enabled)),
        }
    }
    snap
}

/// Background poller over the mod directories.
///
/// The thread only reads the directories and sends a [`WatchEvent`] when the
/// listing changes. Applying the change is left to the thread owning the engine.
pub struct ModWatcher {
    events: Receiver<WatchEvent>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ModWatcher {
    pub fn spawn(paths: GamePaths, interval: Duration) -> Result<Self, SError> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let baseline = snapshot(&paths);

        let flag = stop.clone();
        let handle = thread::Builder::new()
            .name("mod-watcher".into())
            .spawn(move || poll(paths, interval, baseline, tx, flag))?;

        Ok(Self {
            events: rx,
            stop,
            handle: Some(handle),
        })
    }

    /// Next pending event, without blocking.
    pub fn try_next(&self) -> Option<WatchEvent> {
        self.events.try_recv().ok()
    }

    pub fn next_timeout(&self, timeout: Duration) -> Option<WatchEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("Mod watcher thread panicked");
            }
        }
    }
}

impl Drop for ModWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn poll(paths: GamePaths, interval: Duration, mut last: Snapshot, tx: Sender<WatchEvent>, stop: Arc<AtomicBool>) {
    debug!("Mod watcher started ({interval:?})");
    loop {
        let deadline = Instant::now() + interval;
        while !stop.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
        if stop.load(Ordering::SeqCst) {
            break;
        }

        let current = snapshot(&paths);
        if current != last {
            debug!("Mod directories changed ({} archives)", current.len());
            if tx.send(WatchEvent::Changed(current.clone())).is_err() {
                break;
            }
            last = current;
        }
    }
    debug!("Mod watcher stopped");
}
