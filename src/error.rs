/// Failures surfaced by the store and its backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The slot holds text that is not a valid candidate list.
    #[error("stored data under `{key}` is corrupt: {source}")]
    StorageCorrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize candidates: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("unknown stage `{0}` (expected WAITING, IN_CHINESE, IN_ENGLISH or COMPLETED)")]
    InvalidStage(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
