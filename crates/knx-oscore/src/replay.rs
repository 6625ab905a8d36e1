//! Sliding-window anti-replay filter, keyed on Sender ID and optional
//! ID-Context.

use std::collections::HashMap;
use std::time::Instant;

/// Default replay pool size.
pub const DEFAULT_POOL_SIZE: usize = 20;

/// Width of the sliding-window bitmap in bits.
pub const WINDOW_BITS: u32 = 32;

/// The key identifying a replay-filter peer: Sender ID plus an optional
/// ID-Context (used by group OSCORE to disambiguate senders reusing IDs
/// across groups).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerKey {
    pub sender_id: Vec<u8>,
    pub context_id: Option<Vec<u8>>,
}

impl PeerKey {
    pub fn new(sender_id: impl Into<Vec<u8>>, context_id: Option<Vec<u8>>) -> Self {
        Self {
            sender_id: sender_id.into(),
            context_id,
        }
    }
}

/// The result of checking an inbound sequence number against a peer's
/// replay record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// No record exists for this peer: it must be challenged with Echo
    /// before its request is accepted.
    Unsynchronized,
    /// The sequence number was already seen, or falls outside the
    /// acceptable window.
    Reject,
    /// The sequence number is new and was recorded.
    Accept,
}

struct Record {
    ssn_high: u64,
    window: u32,
    last_use: Instant,
}

/// A bounded table of per-peer replay records.
///
/// When full, inserting a new peer evicts the record with the oldest
/// `last_use` timestamp.
pub struct ReplayTable {
    capacity: usize,
    rplwdo: u64,
    records: HashMap<PeerKey, Record>,
}

impl ReplayTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rplwdo: u64::from(WINDOW_BITS),
            records: HashMap::new(),
        }
    }

    /// Override `RPLWDO`, the replay-window-delta-override.
    /// Defaults to the window's bit width.
    pub fn with_rplwdo(mut self, rplwdo: u64) -> Self {
        self.rplwdo = rplwdo;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check and, if accepted, record sequence number `s` from `peer`.
    pub fn check(&mut self, peer: &PeerKey, s: u64) -> ReplayOutcome {
        let Some(record) = self.records.get_mut(peer) else {
            return ReplayOutcome::Unsynchronized;
        };

        if s <= record.ssn_high {
            let diff = record.ssn_high - s;
            if diff >= u64::from(WINDOW_BITS) {
                return ReplayOutcome::Reject;
            }
            let bit = 1u32 << diff;
            if record.window & bit != 0 {
                return ReplayOutcome::Reject;
            }
            record.window |= bit;
            record.last_use = Instant::now();
            ReplayOutcome::Accept
        } else {
            let delta = s - record.ssn_high;
            if delta > self.rplwdo {
                return ReplayOutcome::Reject;
            }
            record.window = if delta >= u64::from(WINDOW_BITS) {
                0
            } else {
                record.window << delta
            };
            record.window |= 1;
            record.ssn_high = s;
            record.last_use = Instant::now();
            ReplayOutcome::Accept
        }
    }

    /// Add (or overwrite) a peer's replay record, as happens once an Echo
    /// challenge synchronizes an unknown peer.
    ///
    /// Resets the window to bit 0 set at `ssn_high`. Evicts the
    /// oldest-by-`last_use` record if the table is full and `peer` is new.
    pub fn add_or_reset(&mut self, peer: PeerKey, ssn_high: u64) {
        if !self.records.contains_key(&peer) && self.records.len() >= self.capacity {
            if let Some(oldest) = self
                .records
                .iter()
                .min_by_key(|(_, r)| r.last_use)
                .map(|(k, _)| k.clone())
            {
                self.records.remove(&oldest);
            }
        }
        self.records.insert(
            peer,
            Record {
                ssn_high,
                window: 1,
                last_use: Instant::now(),
            },
        );
    }

    pub fn contains(&self, peer: &PeerKey) -> bool {
        self.records.contains_key(peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: u8) -> PeerKey {
        PeerKey::new(vec![id], None)
    }

    #[test]
    fn unknown_peer_is_unsynchronized() {
        let mut table = ReplayTable::new(DEFAULT_POOL_SIZE);
        assert_eq!(table.check(&peer(1), 5), ReplayOutcome::Unsynchronized);
    }

    #[test]
    fn first_sequence_after_sync_is_accepted() {
        let mut table = ReplayTable::new(DEFAULT_POOL_SIZE);
        table.add_or_reset(peer(1), 5);
        // No call accepts s' <= 5 after this point.
        assert_eq!(table.check(&peer(1), 4), ReplayOutcome::Reject);
        assert_eq!(table.check(&peer(1), 5), ReplayOutcome::Reject);
    }

    #[test]
    fn monotonic_increase_accepts_and_slides_window() {
        let mut table = ReplayTable::new(DEFAULT_POOL_SIZE);
        table.add_or_reset(peer(1), 5);
        assert_eq!(table.check(&peer(1), 6), ReplayOutcome::Accept);
        // Accepting s=6 (k=1) leaves bit 1 set, bit 0 cleared, ssn_high=6.
        assert_eq!(table.check(&peer(1), 6), ReplayOutcome::Reject);
        assert_eq!(table.check(&peer(1), 5), ReplayOutcome::Reject);
    }

    #[test]
    fn within_window_out_of_order_is_accepted_once() {
        let mut table = ReplayTable::new(DEFAULT_POOL_SIZE);
        table.add_or_reset(peer(1), 10);
        assert_eq!(table.check(&peer(1), 8), ReplayOutcome::Accept);
        assert_eq!(table.check(&peer(1), 8), ReplayOutcome::Reject, "duplicate rejected");
        assert_eq!(table.check(&peer(1), 9), ReplayOutcome::Accept);
    }

    #[test]
    fn too_old_is_rejected() {
        let mut table = ReplayTable::new(DEFAULT_POOL_SIZE);
        table.add_or_reset(peer(1), 100);
        assert_eq!(table.check(&peer(1), 100 - 32), ReplayOutcome::Reject);
    }

    #[test]
    fn window_jump_too_large_is_rejected() {
        let mut table = ReplayTable::new(DEFAULT_POOL_SIZE).with_rplwdo(32);
        table.add_or_reset(peer(1), 10);
        assert_eq!(table.check(&peer(1), 10 + 33), ReplayOutcome::Reject);
        // The record is untouched by the rejected jump.
        assert_eq!(table.check(&peer(1), 11), ReplayOutcome::Accept);
    }

    #[test]
    fn eviction_removes_oldest_when_full() {
        let mut table = ReplayTable::new(2);
        table.add_or_reset(peer(1), 1);
        std::thread::sleep(std::time::Duration::from_millis(2));
        table.add_or_reset(peer(2), 1);
        assert_eq!(table.len(), 2);
        std::thread::sleep(std::time::Duration::from_millis(2));
        table.add_or_reset(peer(3), 1);
        assert_eq!(table.len(), 2);
        assert!(!table.contains(&peer(1)), "oldest peer evicted");
        assert!(table.contains(&peer(2)));
        assert!(table.contains(&peer(3)));
    }
}
