//! # knx-coap
//!
//! The CoAP engine: packet parsing/serialization,
//! request/response correlation, duplicate suppression, and block-wise
//! transfer (RFC 7959) for both client and server roles.
//!
//! ## Modules
//!
//! - [`packet`] — CoAP 1 header, option vector, parse/serialize (RFC 7252).
//! - [`status`] — Response-code taxonomy used across the engine.
//! - [`dedup`] — Duplicate suppression ring buffer.
//! - [`transaction`] — Confirmed-transaction table, matched by mid then token.
//! - [`blockwise`] — Block-wise request/response reassembly state.
//! - [`engine`] — Ties the above into the inbound/outbound CoAP pipeline
//!   stage, including the Echo-challenge retransmit path.

pub mod blockwise;
pub mod dedup;
pub mod engine;
pub mod packet;
pub mod status;
pub mod transaction;

pub use engine::{CoapEngine, FreshnessDecision, InboundOutcome};
pub use packet::{CoapOption, CoapPacket, CoapType, OptionNumber};
pub use status::CoapStatus;

#[derive(Debug, thiserror::Error)]
pub enum CoapError {
    #[error("packet too short")]
    Truncated,
    #[error("malformed option")]
    MalformedOption,
    #[error("unsupported CoAP version")]
    UnsupportedVersion,
}

pub type Result<T> = std::result::Result<T, CoapError>;
