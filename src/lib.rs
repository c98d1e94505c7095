// Library surface for the binary, headless tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod backend;
pub mod board;
pub mod candidate;
pub mod clock;
pub mod config;
pub mod error;
pub mod routing;
pub mod runtime;
pub mod store;
pub mod ui;

pub use backend::{BackendKind, FileBackend, MemoryBackend, SqliteBackend, StorageBackend};
pub use candidate::{Candidate, Stage};
pub use error::StoreError;
pub use store::{Change, CorruptPolicy, Store, Subscription, STORAGE_KEY};
