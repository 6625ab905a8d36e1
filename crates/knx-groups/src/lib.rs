//! # knx-groups
//!
//! The Group Object Table, Recipient/Publisher Table, and s-mode dispatch.
//!
//! ## Modules
//!
//! - [`cflags`] — Communication-flag bitset (`READ`, `WRITE`,
//!   `TRANSMISSION`, `UPDATE`, `INIT`).
//! - [`got`] — Group Object Table: local data-point → group-address
//!   mapping, load-state-gated mutation, CBOR persistence.
//! - [`rpt`] — Recipient/Publisher Table: group address → remote endpoint
//!   mapping used for outbound fan-out.
//! - [`dispatch`] — Inbound group fan-out, outbound s-mode send, and group
//!   multicast address derivation.

pub mod cflags;
pub mod dispatch;
pub mod got;
pub mod rpt;

pub use cflags::CommFlags;
pub use got::{GroupObjectEntry, GroupObjectTable};
pub use rpt::{PublisherEntry, PublisherTarget, RecipientPublisherTable};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GroupsError {
    #[error("mutation attempted outside LOADING load state")]
    NotLoading,
    #[error("entry is missing a required field")]
    MissingField,
    #[error("no entry with this id")]
    NotFound,
    #[error("table is at capacity")]
    TableFull,
    #[error("storage operation failed: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, GroupsError>;

impl From<knx_storage::StorageError> for GroupsError {
    fn from(err: knx_storage::StorageError) -> Self {
        GroupsError::Storage(err.to_string())
    }
}
