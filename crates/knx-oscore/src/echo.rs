//! Echo-challenge freshness (RFC 9175), used when a peer is not yet
//! synchronized with the replay filter.

use std::time::{SystemTime, UNIX_EPOCH};

/// Window within which a retransmitted Echo value is still considered
/// fresh.
pub const FRESHNESS_WINDOW_SECS: u64 = 10;
pub const FRESHNESS_WINDOW: std::time::Duration =
    std::time::Duration::from_secs(FRESHNESS_WINDOW_SECS);

/// Length in bytes of a valid Echo option value.
pub const ECHO_LEN: usize = 8;

/// Errors when validating a received Echo option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EchoError {
    /// The Echo option was not exactly 8 bytes.
    #[error("echo option length {0} != 8")]
    BadLength(usize),
    /// The Echo value is older than `FRESHNESS_WINDOW`; the caller must
    /// issue a fresh challenge.
    #[error("echo value is stale")]
    Stale,
}

/// An 8-byte tick-timestamp Echo challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoChallenge(pub [u8; ECHO_LEN]);

impl EchoChallenge {
    /// Issue a fresh challenge stamped with the current Unix time.
    pub fn issue_at(now_secs: u64) -> Self {
        Self(now_secs.to_be_bytes())
    }

    /// Issue a fresh challenge stamped with the current wall-clock time.
    pub fn issue() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self::issue_at(now)
    }

    pub fn to_bytes(self) -> [u8; ECHO_LEN] {
        self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EchoError> {
        if bytes.len() != ECHO_LEN {
            return Err(EchoError::BadLength(bytes.len()));
        }
        let mut buf = [0u8; ECHO_LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    fn value_secs(self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Validate freshness of a received Echo value against `now_secs`.
    /// Accepts iff `now - echo_value <= FRESHNESS_WINDOW`.
    pub fn check_fresh_at(self, now_secs: u64) -> Result<(), EchoError> {
        let age = now_secs.saturating_sub(self.value_secs());
        if age <= FRESHNESS_WINDOW_SECS {
            Ok(())
        } else {
            Err(EchoError::Stale)
        }
    }
}
