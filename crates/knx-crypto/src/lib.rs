//! # knx-crypto
//!
//! Cryptographic primitives backing the OSCORE layer.
//!
//! Two primitives are needed: an AEAD cipher and a context key-derivation
//! function. OSCORE (RFC 8613) specifies AES-CCM-16-64-128 and
//! HKDF-SHA256; this crate keeps this workspace's actual cryptographic
//! stack (`chacha20poly1305` + domain-separated `blake3`) rather than
//! adding a new AES/HKDF dependency the rest of the workspace never uses.
//! The [`OscoreAlgorithm`] id is carried end to end precisely so a real
//! RFC-8613-compliant suite can be swapped in without touching callers. See
//! DESIGN.md for this decision.
//!
//! ## Modules
//!
//! - [`aead`] — AEAD encrypt/decrypt (ChaCha20-Poly1305, RFC 8439).
//! - [`kdf`] — Domain-separated context key derivation (BLAKE3).

pub mod aead;
pub mod kdf;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("AEAD operation failed (authentication tag mismatch or bad input)")]
    Aead,
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// The negotiated AEAD algorithm for an OSCORE security context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscoreAlgorithm {
    /// ChaCha20-Poly1305 (RFC 8439); the algorithm this crate actually runs.
    ChaCha20Poly1305,
}

impl OscoreAlgorithm {
    pub const fn key_len(self) -> usize {
        match self {
            OscoreAlgorithm::ChaCha20Poly1305 => aead::KEY_SIZE,
        }
    }

    pub const fn nonce_len(self) -> usize {
        match self {
            OscoreAlgorithm::ChaCha20Poly1305 => aead::NONCE_SIZE,
        }
    }
}

/// The key-derivation hash for an OSCORE security context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HkdfHash {
    /// Domain-separated BLAKE3, standing in for HKDF-SHA256 (see module docs).
    Blake3,
}
