//! Per-peer and group OSCORE security contexts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use knx_crypto::{aead, kdf, HkdfHash, OscoreAlgorithm};
use knx_types::GroupAddress;

/// A unicast OSCORE security context for one peer.
pub struct SecurityContext {
    pub sender_id: Vec<u8>,
    pub recipient_id: Vec<u8>,
    sender_key: [u8; aead::KEY_SIZE],
    recipient_key: [u8; aead::KEY_SIZE],
    common_iv: [u8; aead::NONCE_SIZE],
    /// Strictly monotonic outgoing sequence number.
    ssn: AtomicU64,
    pub algorithm: OscoreAlgorithm,
    pub hkdf_hash: HkdfHash,
}

impl SecurityContext {
    /// Derive a fresh context from a shared master secret/salt, as
    /// provisioned out of band (EDHOC/PSK provisioning is out of scope).
    pub fn derive(
        master_secret: &[u8],
        master_salt: &[u8],
        sender_id: Vec<u8>,
        recipient_id: Vec<u8>,
    ) -> Self {
        let sender_key = kdf::derive_key(kdf::contexts::SENDER_KEY, master_secret, master_salt);
        let recipient_key =
            kdf::derive_key(kdf::contexts::RECIPIENT_KEY, master_secret, master_salt);
        let common_iv = kdf::derive_common_iv(master_secret, master_salt);
        Self {
            sender_id,
            recipient_id,
            sender_key,
            recipient_key,
            common_iv,
            ssn: AtomicU64::new(0),
            algorithm: OscoreAlgorithm::ChaCha20Poly1305,
            hkdf_hash: HkdfHash::Blake3,
        }
    }

    /// Take the next outgoing sequence number, incrementing strictly.
    pub fn next_ssn(&self) -> u64 {
        self.ssn.fetch_add(1, Ordering::AcqRel)
    }

    /// Current SSN without advancing it (for tests and diagnostics).
    pub fn peek_ssn(&self) -> u64 {
        self.ssn.load(Ordering::Acquire)
    }

    /// Advance the SSN by one extra step beyond the natural increment, as
    /// required when an Echo-challenge retransmit reuses a request: the
    /// retransmit must never reuse the original message's nonce.
    pub fn bump_for_echo_retransmit(&self) -> u64 {
        // One increment for the retransmit itself, one extra so the nonce
        // can never coincide with the original attempt's.
        self.ssn.fetch_add(2, Ordering::AcqRel) + 1
    }

    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8], piv: u64) -> knx_crypto::Result<Vec<u8>> {
        let nonce = aead::build_nonce(&self.common_iv, &self.sender_id, piv);
        aead::encrypt(&self.sender_key, &nonce, plaintext, aad)
    }

    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        aad: &[u8],
        piv: u64,
    ) -> knx_crypto::Result<Vec<u8>> {
        let nonce = aead::build_nonce(&self.common_iv, &self.recipient_id, piv);
        aead::decrypt(&self.recipient_key, &nonce, ciphertext, aad)
    }
}

/// A group OSCORE security context, additionally keyed by the group
/// multicast address it protects.
pub struct GroupContext {
    pub group_address: GroupAddress,
    group_key: [u8; aead::KEY_SIZE],
    common_iv: [u8; aead::NONCE_SIZE],
    ssn: AtomicU64,
}

impl GroupContext {
    pub fn derive(master_secret: &[u8], master_salt: &[u8], group_address: GroupAddress) -> Self {
        let mut salted = master_salt.to_vec();
        salted.extend_from_slice(&group_address.to_be_bytes());
        let group_key = kdf::derive_key(kdf::contexts::GROUP_SENDER_KEY, master_secret, &salted);
        let common_iv = kdf::derive_common_iv(master_secret, &salted);
        Self {
            group_address,
            group_key,
            common_iv,
            ssn: AtomicU64::new(0),
        }
    }

    pub fn next_ssn(&self) -> u64 {
        self.ssn.fetch_add(1, Ordering::AcqRel)
    }

    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8], sender_id: &[u8], piv: u64) -> knx_crypto::Result<Vec<u8>> {
        let nonce = aead::build_nonce(&self.common_iv, sender_id, piv);
        aead::encrypt(&self.group_key, &nonce, plaintext, aad)
    }
}

/// Looks up security contexts either by the remote peer's Sender ID
/// (inbound) or by destination (outbound), and group contexts by group
/// address.
#[derive(Default)]
pub struct ContextStore {
    by_recipient_id: HashMap<Vec<u8>, SecurityContext>,
    groups: HashMap<GroupAddress, GroupContext>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unicast context, indexed by the remote peer's OSCORE
    /// Sender ID (which becomes our Recipient ID for inbound lookups).
    pub fn insert(&mut self, ctx: SecurityContext) {
        self.by_recipient_id.insert(ctx.recipient_id.clone(), ctx);
    }

    /// Look up the context for an inbound message by the Sender ID carried
    /// in its OSCORE option.
    pub fn by_sender_id(&self, sender_id: &[u8]) -> Option<&SecurityContext> {
        self.by_recipient_id.get(sender_id)
    }

    pub fn insert_group(&mut self, ctx: GroupContext) {
        self.groups.insert(ctx.group_address, ctx);
    }

    pub fn group(&self, group_address: GroupAddress) -> Option<&GroupContext> {
        self.groups.get(&group_address)
    }
}
