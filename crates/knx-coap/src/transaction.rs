//! Confirmed-transaction table: tracks outstanding CON requests/responses so
//! a matching ACK/RST or a retransmitted response can be correlated back to
//! the original exchange.
//!
//! Matched by message ID first (transport-level ACK/RST), falling back to
//! token (application-level response correlation across retransmits),
//! mirroring the two-stage lookup the CoAP engine performs on ingress.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use knx_buffer::MessageBuffer;

/// Default time a transaction is held awaiting an ACK before it is
/// considered abandoned.
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(247); // EXCHANGE_LIFETIME default per RFC 7252 §4.8.2

/// One outstanding transaction: the buffer sent, and what would still
/// satisfy it.
pub struct Transaction {
    pub message_id: u16,
    pub token: Vec<u8>,
    pub buffer: MessageBuffer,
    pub retransmit_count: u8,
    created_at: Instant,
}

/// Table of outstanding transactions, indexed for lookup by either key CoAP
/// uses to correlate a reply.
pub struct TransactionTable {
    timeout: Duration,
    by_message_id: HashMap<u16, Transaction>,
}

impl TransactionTable {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TRANSACTION_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            by_message_id: HashMap::new(),
        }
    }

    pub fn insert(&mut self, message_id: u16, token: Vec<u8>, buffer: MessageBuffer) {
        self.by_message_id.insert(
            message_id,
            Transaction {
                message_id,
                token,
                buffer,
                retransmit_count: 0,
                created_at: Instant::now(),
            },
        );
    }

    /// Look up by message ID (ACK/RST correlation).
    pub fn by_message_id(&self, message_id: u16) -> Option<&Transaction> {
        self.by_message_id.get(&message_id)
    }

    /// Look up by token, falling back from message-ID matching when a
    /// retransmitted response arrives with a new message ID but the same
    /// token.
    pub fn by_token(&self, token: &[u8]) -> Option<&Transaction> {
        self.by_message_id.values().find(|t| t.token == token)
    }

    pub fn complete(&mut self, message_id: u16) -> Option<MessageBuffer> {
        self.by_message_id.remove(&message_id).map(|t| t.buffer)
    }

    pub fn complete_by_token(&mut self, token: &[u8]) -> Option<MessageBuffer> {
        let message_id = self
            .by_message_id
            .values()
            .find(|t| t.token == token)
            .map(|t| t.message_id)?;
        self.complete(message_id)
    }

    pub fn mark_retransmitted(&mut self, message_id: u16) -> Option<u8> {
        self.by_message_id.get_mut(&message_id).map(|t| {
            t.retransmit_count += 1;
            t.retransmit_count
        })
    }

    /// Drop transactions that never received a reply within the exchange
    /// lifetime, releasing their buffer reference.
    pub fn scrub_expired(&mut self, now: Instant) {
        let timeout = self.timeout;
        self.by_message_id
            .retain(|_, t| now.duration_since(t.created_at) < timeout);
    }

    pub fn len(&self) -> usize {
        self.by_message_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_message_id.is_empty()
    }
}

impl Default for TransactionTable {
    fn default() -> Self {
        Self::new()
    }
}
