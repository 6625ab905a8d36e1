//! # knx-types
//!
//! Shared domain types used across the KNX-IoT message-plane workspace:
//! endpoints, transport flags, pipeline events, and the stable small-integer
//! CBOR field keys used on the wire.

pub mod cbor_keys;
pub mod endpoint;
pub mod event;
pub mod loadstate;

pub use endpoint::{Endpoint, TransportFlags};
pub use event::{Event, EventKind};
pub use loadstate::{LoadState, ResetCode};

/// Maximum CoAP protocol data unit size this stack allocates buffers for.
pub const OC_PDU_SIZE: usize = 1280;

/// Maximum length of an OSCORE Sender/Recipient ID, in bytes.
pub const OSCORE_ID_MAX_LEN: usize = 13;

/// A KNX group address. Variable-width on the wire (16–32 bits); stored
/// widened to `u32` in memory.
pub type GroupAddress = u32;

/// A KNX individual (unicast) address.
pub type IndividualAddress = u16;
