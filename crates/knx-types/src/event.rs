//! Pipeline event kinds posted between scheduler processes.

use serde::{Deserialize, Serialize};

/// The kind of a pipeline event. Each event carries exactly one buffer
/// reference by id; posting an event transfers ownership of that reference
/// to the receiving process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    InboundNetwork,
    InboundOscore,
    InboundRi,
    OutboundNetwork,
    OutboundNetworkEncrypted,
    OutboundOscore,
    OutboundGroupOscore,
    TlsCloseAllSessions,
    InterfaceUp,
    InterfaceDown,
}

/// A scheduler event: a kind plus the id of the buffer it carries.
///
/// `buffer_id` indexes into the pool owning the referenced
/// `knx_buffer::MessageBuffer`; the event itself never holds the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub buffer_id: u64,
}

impl Event {
    pub fn new(kind: EventKind, buffer_id: u64) -> Self {
        Self { kind, buffer_id }
    }
}
