use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::{debug, warn};

use crate::backend::StorageBackend;
use crate::store::{fingerprint, WriteMarker};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum BoardEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The storage slot was rewritten by another process.
    StorageChanged,
}

/// Source of board events (keyboard, resize, storage, ...)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<BoardEvent, RecvTimeoutError>;
}

/// Production event source: a crossterm reader thread feeding a channel.
///
/// [`CrosstermEventSource::sender`] hands out the channel so other producers
/// (the storage watcher) can feed the same loop.
pub struct CrosstermEventSource {
    tx: Sender<BoardEvent>,
    rx: Receiver<BoardEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        thread::spawn(move || loop {
            let sent = match event::read() {
                Ok(CtEvent::Key(key)) => key_tx.send(BoardEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => key_tx.send(BoardEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if sent.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<BoardEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<BoardEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for tests
pub struct TestEventSource {
    rx: Receiver<BoardEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<BoardEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<BoardEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> BoardEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => BoardEvent::Tick,
        }
    }
}

/// Polls a storage slot from a background thread and reports rewrites made
/// by someone other than this process.
pub struct StorageWatcher {
    handle: JoinHandle<()>,
}

impl StorageWatcher {
    /// `backend` must be a separate handle onto the same storage the store
    /// uses. The thread exits once `tx`'s receiver is gone.
    pub fn spawn<B>(
        backend: B,
        key: &'static str,
        marker: WriteMarker,
        interval: Duration,
        tx: Sender<BoardEvent>,
    ) -> Self
    where
        B: StorageBackend + Send + 'static,
    {
        let mut last_seen = read_fingerprint(&backend, key);
        let handle = thread::spawn(move || {
            loop {
                thread::sleep(interval);
                let current = read_fingerprint(&backend, key);
                if current == last_seen {
                    continue;
                }
                last_seen = current;
                if current == Some(marker.last()) {
                    continue;
                }
                debug!(key, "storage slot changed externally");
                if tx.send(BoardEvent::StorageChanged).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn read_fingerprint<B: StorageBackend>(backend: &B, key: &str) -> Option<u64> {
    match backend.get(key) {
        Ok(text) => text.map(|t| fingerprint(&t)),
        Err(e) => {
            warn!(key, "storage watcher read failed: {e}");
            None
        }
    }
}
