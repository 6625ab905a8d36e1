//! Domain-separated context key derivation (standing in for HKDF-SHA256;
//! see module-level docs in `lib.rs`).

/// Registered derivation context strings for OSCORE security-context setup
/// (RFC 8613 §3.2's `info` structure, collapsed into domain-separated
/// `blake3::derive_key` contexts).
pub mod contexts {
    pub const SENDER_KEY: &str = "KNX-IoT v1 oscore-sender-key";
    pub const RECIPIENT_KEY: &str = "KNX-IoT v1 oscore-recipient-key";
    pub const COMMON_IV: &str = "KNX-IoT v1 oscore-common-iv";
    pub const GROUP_SENDER_KEY: &str = "KNX-IoT v1 oscore-group-sender-key";
}

/// Derive a 32-byte key from `master_secret` under `context`, salted by
/// `master_salt` (concatenated into the key material, as BLAKE3's
/// `derive_key` takes a single key-material slice rather than HKDF's
/// separate salt/IKM arguments).
pub fn derive_key(context: &str, master_secret: &[u8], master_salt: &[u8]) -> [u8; 32] {
    let mut key_material = Vec::with_capacity(master_secret.len() + master_salt.len());
    key_material.extend_from_slice(master_secret);
    key_material.extend_from_slice(master_salt);
    blake3::derive_key(context, &key_material)
}

/// Derive the 12-byte common IV for an OSCORE context, truncating the
/// derived key material to the AEAD nonce size.
pub fn derive_common_iv(master_secret: &[u8], master_salt: &[u8]) -> [u8; crate::aead::NONCE_SIZE] {
    let full = derive_key(contexts::COMMON_IV, master_secret, master_salt);
    let mut iv = [0u8; crate::aead::NONCE_SIZE];
    iv.copy_from_slice(&full[..crate::aead::NONCE_SIZE]);
    iv
}
