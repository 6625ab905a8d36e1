//! Duplicate suppression for inbound Confirmable/Non-confirmable messages:
//! a CON retransmitted before the original's response arrives must not be
//! processed twice.
//!
//! Modeled as a small ring of the most recently seen `(message_id, device)`
//! pairs, mirroring how the retransmit cache bounds memory rather than
//! growing a table without limit.

use std::collections::VecDeque;

use knx_types::endpoint::Endpoint;

const DEFAULT_CAPACITY: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SeenKey {
    message_id: u16,
    device_index: usize,
}

/// Bounded ring of recently-seen `(message_id, device)` keys.
pub struct DuplicateFilter {
    capacity: usize,
    seen: VecDeque<SeenKey>,
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            seen: VecDeque::with_capacity(capacity),
        }
    }

    /// Returns `true` if this is the first time `(message_id, endpoint)` has
    /// been observed, recording it either way. A `false` return means the
    /// caller should suppress processing (but for a CON, still retransmit
    /// the cached response if one exists).
    pub fn observe(&mut self, message_id: u16, endpoint: &Endpoint) -> bool {
        let key = SeenKey {
            message_id,
            device_index: endpoint.device_index,
        };
        if self.seen.contains(&key) {
            return false;
        }
        if self.seen.len() >= self.capacity {
            self.seen.pop_front();
        }
        self.seen.push_back(key);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::new()
    }
}
