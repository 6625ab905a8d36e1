//! ChaCha20-Poly1305 AEAD encryption (RFC 8439).
//!
//! Used to encrypt/decrypt the OSCORE ciphertext: the inner CoAP message
//! under the per-direction sender/recipient key, with the AEAD nonce built
//! from the common IV XORed with the partial IV.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};

use crate::{CryptoError, Result};

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for ChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key`/`nonce`, authenticating `aad` (the
/// OSCORE external_aad) without encrypting it.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = Nonce::from_slice(nonce);
    cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Aead)
}

/// Decrypt `ciphertext` (with its appended tag) under `key`/`nonce`,
/// verifying `aad`. Returns `Err` on any authentication failure; callers
/// must treat this as a quiet drop, never log the plaintext.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = Nonce::from_slice(nonce);
    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Aead)
}

/// Build the AEAD nonce from the OSCORE common IV and a partial IV
/// (sequence number), per RFC 8613 §5.2: `nonce = common_iv XOR
/// (0x00..sender_id_len || piv)`, with the partial IV right-aligned in the
/// low-order bytes.
pub fn build_nonce(common_iv: &[u8; NONCE_SIZE], sender_id: &[u8], piv: u64) -> [u8; NONCE_SIZE] {
    let mut padded = [0u8; NONCE_SIZE];
    // Partial IV occupies the low-order bytes.
    let piv_bytes = piv.to_be_bytes();
    padded[NONCE_SIZE - piv_bytes.len()..].copy_from_slice(&piv_bytes);
    // Sender ID length byte plus sender ID occupy the bytes just before the
    // partial IV, matching RFC 8613's `(size || ID_PIV)` construction,
    // truncated to fit the remaining space.
    let id_space = NONCE_SIZE - piv_bytes.len();
    let id_len = sender_id.len().min(id_space);
    padded[id_space - id_len..id_space].copy_from_slice(&sender_id[sender_id.len() - id_len..]);

    let mut nonce = [0u8; NONCE_SIZE];
    for i in 0..NONCE_SIZE {
        nonce[i] = common_iv[i] ^ padded[i];
    }
    nonce
}
