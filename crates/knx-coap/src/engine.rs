//! Ties the packet, dedup, transaction, and block-wise modules into the
//! inbound/outbound CoAP pipeline stage, including the
//! Echo-challenge freshness path that gates OSCORE-protected requests from
//! peers the replay filter hasn't synchronized with yet.

use std::time::{Duration, Instant};

use knx_buffer::MessageBuffer;
use knx_oscore::{EchoChallenge, PeerKey, ReplayOutcome, ReplayTable, RetransmitCache};
use knx_types::endpoint::Endpoint;

use crate::blockwise::{BlockwiseError, BlockwiseTable, BlockwiseTransfer, Role};
use crate::dedup::DuplicateFilter;
use crate::packet::{BlockValue, CoapPacket};
use crate::transaction::TransactionTable;

/// Outcome of observing an inbound packet against the duplicate filter.
#[derive(Debug)]
pub enum InboundOutcome {
    /// First time this `(message_id, device)` has been seen; proceed.
    Fresh,
    /// A retransmitted Confirmable arrived before its response did, and no
    /// cached response exists yet: suppress, the original is still being
    /// processed.
    DuplicateSuppressed,
    /// A retransmitted Confirmable arrived, but a response to the original
    /// was already cached: resend it rather than reprocessing.
    DuplicateWithCachedResponse(MessageBuffer),
}

/// What the freshness gate (Echo challenge + replay filter) decided about
/// an inbound OSCORE-protected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshnessDecision {
    /// Sequence number is acceptable; the request may proceed.
    Proceed,
    /// The peer is unsynchronized (or sent a stale/missing Echo) and must
    /// be challenged before its request is accepted.
    Challenge(EchoChallenge),
    /// The sequence number falls outside the acceptable window: reject.
    Reject,
    /// The Echo option was present but malformed (wrong length): the
    /// request is rejected as 4.02 Bad Option rather than re-challenged.
    BadOption,
}

/// The CoAP engine: owns all per-connection pipeline state.
pub struct CoapEngine {
    dedup: DuplicateFilter,
    transactions: TransactionTable,
    blockwise: BlockwiseTable,
    retransmit: RetransmitCache,
    replay: ReplayTable,
    blockwise_timeout: Duration,
}

impl CoapEngine {
    pub fn new(replay_capacity: usize) -> Self {
        Self {
            dedup: DuplicateFilter::new(),
            transactions: TransactionTable::new(),
            blockwise: BlockwiseTable::new(),
            retransmit: RetransmitCache::new(),
            replay: ReplayTable::new(replay_capacity),
            blockwise_timeout: crate::blockwise::DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    /// First pipeline stage on ingress: suppress retransmitted Confirmable
    /// messages, resending a cached response instead of reprocessing them.
    pub fn observe_inbound(&mut self, packet: &CoapPacket, endpoint: &Endpoint) -> InboundOutcome {
        if self.dedup.observe(packet.message_id, endpoint) {
            return InboundOutcome::Fresh;
        }
        match self.retransmit.take(&packet.token) {
            Some(cached) => InboundOutcome::DuplicateWithCachedResponse(cached),
            None => InboundOutcome::DuplicateSuppressed,
        }
    }

    /// Check an inbound OSCORE sequence number against the replay filter,
    /// issuing an Echo challenge if the peer isn't synchronized yet.
    pub fn check_freshness(
        &mut self,
        peer: &PeerKey,
        ssn: u64,
        echo_reply: Option<&[u8]>,
        now_secs: u64,
    ) -> FreshnessDecision {
        match self.replay.check(peer, ssn) {
            ReplayOutcome::Accept => FreshnessDecision::Proceed,
            ReplayOutcome::Reject => FreshnessDecision::Reject,
            ReplayOutcome::Unsynchronized => match echo_reply {
                Some(bytes) => match EchoChallenge::from_slice(bytes) {
                    Ok(echo) if echo.check_fresh_at(now_secs).is_ok() => {
                        self.replay.add_or_reset(peer.clone(), ssn);
                        FreshnessDecision::Proceed
                    }
                    Ok(_) => FreshnessDecision::Challenge(EchoChallenge::issue_at(now_secs)),
                    Err(_) => FreshnessDecision::BadOption,
                },
                None => FreshnessDecision::Challenge(EchoChallenge::issue_at(now_secs)),
            },
        }
    }

    pub fn register_transaction(&mut self, message_id: u16, token: Vec<u8>, buffer: MessageBuffer) {
        self.transactions.insert(message_id, token, buffer);
    }

    pub fn complete_transaction(&mut self, message_id: u16) -> Option<MessageBuffer> {
        self.transactions.complete(message_id)
    }

    /// Soft-reference a response for possible retransmit, and release the
    /// normal transaction-table hold on it.
    pub fn cache_for_possible_retransmit(&mut self, token: Vec<u8>, response: MessageBuffer) {
        self.retransmit.insert(token, response);
    }

    pub fn start_incoming_blockwise(
        &mut self,
        role: Role,
        href: String,
        method_or_status: u8,
        token: Vec<u8>,
    ) {
        self.blockwise
            .start(BlockwiseTransfer::new(role, href, method_or_status, token));
    }

    pub fn append_incoming_block(
        &mut self,
        href: &str,
        token: &[u8],
        block: BlockValue,
        chunk: &[u8],
    ) -> Result<bool, BlockwiseError> {
        let transfer = self
            .blockwise
            .get_mut(href, token)
            .ok_or(BlockwiseError::NotStarted)?;
        transfer.append_incoming(block, chunk)
    }

    pub fn finish_incoming_blockwise(&mut self, href: &str, token: &[u8]) -> Option<Vec<u8>> {
        self.blockwise.complete(href, token).map(|t| t.into_payload())
    }

    /// Periodic sweep: scrubs expired transactions, idle block-wise
    /// transfers, and timed-out retransmit cache entries in one pass, as
    /// the scheduler's housekeeping process does.
    pub fn scrub(&mut self, now: Instant) {
        self.transactions.scrub_expired(now);
        self.blockwise.scrub_idle(now, self.blockwise_timeout);
        self.retransmit.scrub_expired(now);
    }
}
