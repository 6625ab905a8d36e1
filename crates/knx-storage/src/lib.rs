//! # knx-storage
//!
//! A key→bytes store for small CBOR blobs (Group Object Table entries,
//! Recipient/Publisher Table entries, device identity). The core never
//! reasons about the backend's durability model beyond "read my last
//! write"; callers treat a failed decode on reload as an empty slot, never
//! a crash.
//!
//! [`Storage`] is the collaborator interface the rest of the crate calls.
//! [`SqliteStorage`] is the production backend, modeled on `ochra-db`'s use
//! of `rusqlite` with WAL mode. [`MemoryStorage`] backs tests and any
//! deployment that only needs session-lifetime persistence.

pub mod cbor;
pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Storage error types.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cbor encode error: {0}")]
    CborEncode(String),
    #[error("cbor decode error: {0}")]
    CborDecode(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// A key→bytes persistence interface.
///
/// Implementations must not reorder writes to the same key:
/// a write must be durable, or at least ordered, before the call returns
/// or before any later read of that key is permitted to observe it.
pub trait Storage: Send + Sync {
    /// Atomically overwrite `key`'s value.
    fn write(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Read `key`'s current value, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove `key` entirely.
    fn erase(&self, key: &str) -> Result<()>;

    /// List all keys sharing `prefix`, for bulk reload of a table
    /// (`GOT_STORE_{n}`, `GPUBT_STORE_{n}`, `GRECT_STORE_{n}`).
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Build the slotted storage key for table index `index` under `prefix`,
/// e.g. `GOT_STORE_3`.
pub fn slot_key(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index}")
}
