//! Block-wise transfer state (RFC 7959): reassembly of an inbound BLOCK1
//! request or outbound BLOCK2 response, spanning multiple CoAP exchanges.
//!
//! A transfer outlives any single packet, so unlike [`crate::packet`] it is
//! held in a table and scrubbed like the transaction table and retransmit
//! cache it sits alongside.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::packet::BlockValue;

/// Default block size exponent when a peer doesn't negotiate one (64 bytes).
pub const DEFAULT_BLOCK_SZX: u8 = 2;

/// Which side of the transfer this state tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// We are reassembling an inbound request body (server-side BLOCK1).
    ServerIncoming,
    /// We are chunking an outbound response body (server-side BLOCK2).
    ServerOutgoing,
    /// We are sending a request body in chunks (client-side BLOCK1).
    ClientOutgoing,
    /// We are reassembling a response body (client-side BLOCK2).
    ClientIncoming,
}

/// Errors from block-wise reassembly.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BlockwiseError {
    #[error("block {expected} expected, got {actual}")]
    OutOfOrder { expected: u32, actual: u32 },
    #[error("reassembled payload exceeds the configured maximum of {max} bytes")]
    TooLarge { max: usize },
    #[error("no block-wise transfer in progress for this href/token")]
    NotStarted,
}

/// Default cap on a fully reassembled body.
pub const DEFAULT_MAX_BODY: usize = 64 * 1024;

/// Maximum time a block-wise transfer may sit idle before it is scrubbed.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(247);

/// One in-progress block-wise transfer.
pub struct BlockwiseTransfer {
    pub role: Role,
    pub href: String,
    pub method_or_status: u8,
    payload: Vec<u8>,
    pub next_block: u32,
    pub szx: u8,
    pub content_format: Option<u16>,
    pub etag: Option<Vec<u8>>,
    pub observe_sequence: Option<u32>,
    pub query: Option<String>,
    pub token: Vec<u8>,
    max_body: usize,
    last_progress: Instant,
}

impl BlockwiseTransfer {
    pub fn new(role: Role, href: String, method_or_status: u8, token: Vec<u8>) -> Self {
        Self {
            role,
            href,
            method_or_status,
            payload: Vec::new(),
            next_block: 0,
            szx: DEFAULT_BLOCK_SZX,
            content_format: None,
            etag: None,
            observe_sequence: None,
            query: None,
            token,
            max_body: DEFAULT_MAX_BODY,
            last_progress: Instant::now(),
        }
    }

    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    /// Append the next incoming block. Rejects a block that doesn't match
    /// the expected sequence number, so a duplicate or reordered block
    /// can't corrupt the reassembled body.
    pub fn append_incoming(&mut self, block: BlockValue, chunk: &[u8]) -> Result<bool, BlockwiseError> {
        if block.num != self.next_block {
            return Err(BlockwiseError::OutOfOrder {
                expected: self.next_block,
                actual: block.num,
            });
        }
        if self.payload.len() + chunk.len() > self.max_body {
            return Err(BlockwiseError::TooLarge { max: self.max_body });
        }
        self.payload.extend_from_slice(chunk);
        self.next_block += 1;
        self.szx = block.szx;
        self.last_progress = Instant::now();
        Ok(!block.more)
    }

    /// Slice out the next outgoing block of the configured size, returning
    /// the block descriptor and whether more blocks remain after it.
    pub fn next_outgoing_block(&mut self) -> (BlockValue, &[u8]) {
        let size = 1usize << (self.szx as u32 + 4);
        let start = (self.next_block as usize) * size;
        let end = (start + size).min(self.payload.len());
        let more = end < self.payload.len();
        let block = BlockValue {
            num: self.next_block,
            more,
            szx: self.szx,
        };
        if more {
            self.next_block += 1;
        }
        self.last_progress = Instant::now();
        (block, &self.payload[start..end])
    }

    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn is_idle_since(&self, now: Instant, timeout: Duration) -> bool {
        now.duration_since(self.last_progress) >= timeout
    }
}

/// Table of in-progress block-wise transfers, keyed by `(href, token)` so a
/// client request and a server's reassembly of it don't collide.
#[derive(Default)]
pub struct BlockwiseTable {
    transfers: HashMap<(String, Vec<u8>), BlockwiseTransfer>,
}

impl BlockwiseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, transfer: BlockwiseTransfer) {
        let key = (transfer.href.clone(), transfer.token.clone());
        self.transfers.insert(key, transfer);
    }

    pub fn get_mut(&mut self, href: &str, token: &[u8]) -> Option<&mut BlockwiseTransfer> {
        self.transfers.get_mut(&(href.to_string(), token.to_vec()))
    }

    pub fn complete(&mut self, href: &str, token: &[u8]) -> Option<BlockwiseTransfer> {
        self.transfers.remove(&(href.to_string(), token.to_vec()))
    }

    pub fn scrub_idle(&mut self, now: Instant, timeout: Duration) {
        self.transfers
            .retain(|_, t| !t.is_idle_since(now, timeout));
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}
