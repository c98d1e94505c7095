use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::StorageBackend;
use crate::candidate::{seed_candidates, Candidate, Stage};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StoreError};

/// Key of the single slot holding the whole candidate list.
pub const STORAGE_KEY: &str = "interview_candidates_v1";

/// What `list` does when the slot holds unparseable text
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CorruptPolicy {
    /// Surface `StoreError::StorageCorrupt` to the caller.
    #[default]
    Fail,
    /// Overwrite the slot with the seed set and carry on.
    Reseed,
}

/// Notification payload handed to subscribers after a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added { id: String },
    Moved { id: String, to: Stage },
    Removed { id: String },
    Reset,
    /// Another process rewrote the slot.
    External,
}

type Listener = Rc<dyn Fn(&Change)>;

#[derive(Default)]
struct Observers {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener)>>,
}

impl Observers {
    fn add(&self, listener: Listener) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn remove(&self, id: u64) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    fn dispatch(&self, change: &Change) {
        // Snapshot first so listeners may subscribe or unsubscribe while running.
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(change);
        }
    }
}

/// Handle returned by [`Store::subscribe`]. The listener stays registered
/// until this is dropped or [`Subscription::unsubscribe`] is called.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    observers: Weak<Observers>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.remove(self.id);
        }
    }
}

/// Content hash used to tell slot revisions apart.
pub fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Fingerprint of the last text this process wrote, shared with the storage
/// watcher so it can skip our own writes.
#[derive(Debug, Clone, Default)]
pub struct WriteMarker(Arc<AtomicU64>);

impl WriteMarker {
    pub fn record(&self, text: &str) {
        self.0.store(fingerprint(text), Ordering::SeqCst);
    }

    pub fn last(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// The authoritative candidate list.
///
/// Every call re-reads the slot; there is no cache. Mutations rewrite the
/// whole list and then notify subscribers synchronously. Concurrent writers
/// in other processes are not coordinated: the last write wins.
pub struct Store<B: StorageBackend, C: Clock = SystemClock> {
    backend: B,
    clock: C,
    seed: Vec<Candidate>,
    on_corrupt: CorruptPolicy,
    observers: Rc<Observers>,
    marker: WriteMarker,
}

impl<B: StorageBackend> Store<B, SystemClock> {
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, SystemClock)
    }
}

impl<B: StorageBackend, C: Clock> Store<B, C> {
    /// Build a store. Seed timestamps are taken from `clock` here, once, and
    /// reused verbatim by every [`Store::reset`].
    pub fn with_clock(backend: B, clock: C) -> Self {
        let seed = seed_candidates(clock.now_ms());
        Self {
            backend,
            clock,
            seed,
            on_corrupt: CorruptPolicy::default(),
            observers: Rc::new(Observers::default()),
            marker: WriteMarker::default(),
        }
    }

    pub fn on_corrupt(mut self, policy: CorruptPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    pub fn key(&self) -> &'static str {
        STORAGE_KEY
    }

    pub fn seed(&self) -> &[Candidate] {
        &self.seed
    }

    pub fn write_marker(&self) -> WriteMarker {
        self.marker.clone()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Seed the slot if it is empty. Does not notify.
    pub fn init(&self) -> Result<()> {
        self.list().map(|_| ())
    }

    /// Current candidates, parsed fresh from storage.
    ///
    /// An empty slot is initialised with the seed set, which is persisted and
    /// returned without notifying subscribers.
    pub fn list(&self) -> Result<Vec<Candidate>> {
        let text = match self.backend.get(STORAGE_KEY)? {
            Some(text) if !text.is_empty() => text,
            _ => {
                debug!("slot {STORAGE_KEY} empty, writing seed set");
                self.write(&self.seed)?;
                return Ok(self.seed.clone());
            }
        };

        match serde_json::from_str::<Vec<Candidate>>(&text) {
            Ok(candidates) => Ok(candidates),
            Err(source) => match self.on_corrupt {
                CorruptPolicy::Fail => Err(StoreError::StorageCorrupt {
                    key: STORAGE_KEY.to_string(),
                    source,
                }),
                CorruptPolicy::Reseed => {
                    warn!("slot {STORAGE_KEY} is corrupt ({source}), reinitialising with seed set");
                    self.write(&self.seed)?;
                    Ok(self.seed.clone())
                }
            },
        }
    }

    /// Check in a new candidate.
    ///
    /// The store accepts any `name` and `role` as given. Trimming and
    /// rejecting blank names is left to the caller.
    pub fn add(&self, name: &str, role: &str) -> Result<Candidate> {
        let mut candidates = self.list()?;
        let candidate = Candidate::new(
            Uuid::new_v4().to_string(),
            name,
            role,
            self.clock.now_ms(),
        );
        candidates.push(candidate.clone());
        info!(id = %candidate.id, name = %candidate.name, "candidate added");
        self.commit(
            &candidates,
            Change::Added {
                id: candidate.id.clone(),
            },
        )?;
        Ok(candidate)
    }

    /// Move a candidate to `to`. Any transition is accepted; leaving an
    /// interview stage marks that interview complete. An unknown id changes
    /// nothing but the list is still written back and subscribers notified.
    pub fn move_stage(&self, id: &str, to: Stage) -> Result<()> {
        let mut candidates = self.list()?;
        let now = self.clock.now_ms();
        match candidates.iter_mut().find(|c| c.id == id) {
            Some(candidate) => {
                let from = candidate.current_stage;
                candidate.transition_to(to, now);
                info!(%id, %from, %to, "candidate moved");
            }
            None => debug!(%id, "move_stage: no such candidate"),
        }
        self.commit(
            &candidates,
            Change::Moved {
                id: id.to_string(),
                to,
            },
        )
    }

    /// Drop a candidate. Unknown ids leave the list as it was.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut candidates = self.list()?;
        let before = candidates.len();
        candidates.retain(|c| c.id != id);
        if candidates.len() < before {
            info!(%id, "candidate removed");
        } else {
            debug!(%id, "remove: no such candidate");
        }
        self.commit(&candidates, Change::Removed { id: id.to_string() })
    }

    /// Replace everything with the seed set captured at construction.
    pub fn reset(&self) -> Result<()> {
        info!("board reset to seed set");
        self.commit(&self.seed, Change::Reset)
    }

    /// Register `listener` for every subsequent change, local or external.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Change) + 'static,
    {
        let id = self.observers.add(Rc::new(listener));
        Subscription {
            id,
            observers: Rc::downgrade(&self.observers),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.observers.listeners.borrow().len()
    }

    /// Forward a storage change made by another process to subscribers.
    pub fn notify_external(&self) {
        debug!("external change to {STORAGE_KEY}");
        self.observers.dispatch(&Change::External);
    }

    fn commit(&self, candidates: &[Candidate], change: Change) -> Result<()> {
        self.write(candidates)?;
        self.observers.dispatch(&change);
        Ok(())
    }

    fn write(&self, candidates: &[Candidate]) -> Result<()> {
        let text = serde_json::to_string(candidates).map_err(StoreError::Serialize)?;
        self.marker.record(&text);
        self.backend.set(STORAGE_KEY, &text)?;
        debug!(count = candidates.len(), "wrote {STORAGE_KEY}");
        Ok(())
    }
}
