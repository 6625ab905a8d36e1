//! # knx-oscore
//!
//! The OSCORE end-to-end security layer: per-peer
//! security contexts, the sliding-window anti-replay filter, the Echo
//! freshness challenge, and a soft-reference retransmit cache for
//! Echo-challenge retries.
//!
//! ## Modules
//!
//! - [`context`] — Per-peer and group OSCORE security contexts.
//! - [`replay`] — Sliding-window replay filter.
//! - [`echo`] — Echo-challenge freshness.
//! - [`retransmit`] — Soft-referenced cache of outbound buffers awaiting an
//!   Echo-challenge retransmit.

pub mod context;
pub mod echo;
pub mod replay;
pub mod retransmit;

pub use context::{ContextStore, GroupContext, SecurityContext};
pub use echo::{EchoChallenge, EchoError, FRESHNESS_WINDOW};
pub use replay::{PeerKey, ReplayOutcome, ReplayTable};
pub use retransmit::RetransmitCache;

/// Errors raised by the OSCORE layer.
#[derive(Debug, thiserror::Error)]
pub enum OscoreError {
    #[error("no security context for this peer")]
    NoContext,
    #[error(transparent)]
    Crypto(#[from] knx_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, OscoreError>;
