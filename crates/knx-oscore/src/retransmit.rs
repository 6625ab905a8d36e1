//! Soft-referenced cache of outbound buffers awaiting a possible
//! Echo-challenge retransmit.
//!
//! A "soft reference" in the original C source is a ref count with a
//! delayed-free callback armed for a timeout. In this port the buffer
//! handle's own `Drop` already does the unref; the cache's job is only to
//! hold one extra [`knx_buffer::MessageBuffer`] clone alive until either it
//! is explicitly taken (a retransmit arrived) or it times out, at which
//! point dropping the entry releases that extra reference.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use knx_buffer::MessageBuffer;

/// Default soft-reference timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

struct CachedRecord {
    buffer: MessageBuffer,
    inserted_at: Instant,
}

/// A token-keyed cache of buffers retained in case their request needs to
/// be retransmitted after a 4.01 Unauthorized + Echo challenge.
pub struct RetransmitCache {
    timeout: Duration,
    records: HashMap<Vec<u8>, CachedRecord>,
}

impl RetransmitCache {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            records: HashMap::new(),
        }
    }

    /// Soft-reference `buffer` under `token`, extending its lifetime past
    /// the transaction table entry that would otherwise free it.
    pub fn insert(&mut self, token: Vec<u8>, buffer: MessageBuffer) {
        self.records.insert(
            token,
            CachedRecord {
                buffer,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Take back a previously-cached buffer by token, e.g. because a
    /// retransmit carrying the matching Echo arrived. Removes the entry
    /// unconditionally (found or not).
    pub fn take(&mut self, token: &[u8]) -> Option<MessageBuffer> {
        self.records.remove(token).map(|r| r.buffer)
    }

    /// Explicit unref without taking the buffer: used when the transaction
    /// completed normally and the soft reference is no longer needed.
    pub fn drop_entry(&mut self, token: &[u8]) {
        self.records.remove(token);
    }

    /// Scrub entries older than the configured timeout, releasing their
    /// extra reference (stack-pressure / periodic sweep ).
    pub fn scrub_expired(&mut self, now: Instant) {
        let timeout = self.timeout;
        self.records
            .retain(|_, record| now.duration_since(record.inserted_at) < timeout);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for RetransmitCache {
    fn default() -> Self {
        Self::new()
    }
}
