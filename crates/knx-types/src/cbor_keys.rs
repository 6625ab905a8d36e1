//! Stable small-integer CBOR field keys.
//!
//! KNX-IoT payloads use short integer map keys instead of string keys to
//! keep CBOR encodings compact. These are part of the wire contract and
//! must never be renumbered.

pub const ID: i64 = 0;
pub const VALUE: i64 = 1;
pub const SIA: i64 = 4;
pub const S_MODE: i64 = 5;
pub const ST: i64 = 6;
pub const GA: i64 = 7;
pub const CFLAGS: i64 = 8;
pub const URL: i64 = 10;
pub const HREF: i64 = 11;
pub const IA: i64 = 12;
pub const GRPID: i64 = 13;
pub const AT: i64 = 14;
pub const FID: i64 = 25;
pub const IID: i64 = 26;
pub const SEC_SETTINGS: i64 = 28;
pub const A: i64 = 97;
pub const C: i64 = 99;
pub const GROUP_KEY: i64 = 107;
pub const PATH: i64 = 112;
pub const S: i64 = 115;
pub const DATA_TYPE: i64 = 116;

/// The `st` (service type) string values used in the s-mode envelope.
pub mod service_type {
    pub const READ: &str = "r";
    pub const WRITE: &str = "w";
    pub const READ_RESPONSE: &str = "rp";
}
