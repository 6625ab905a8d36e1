//! Endpoint identity: who a message came from or is going to.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::{GroupAddress, OSCORE_ID_MAX_LEN};

/// Transport flag bits carried alongside a message buffer.
///
/// Modeled as a plain `u16` bitset rather than pulling in a bitflags crate:
/// the set is small, fixed, and never negotiated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransportFlags(u16);

impl TransportFlags {
    pub const IPV6: Self = Self(1 << 0);
    pub const IPV4: Self = Self(1 << 1);
    pub const SECURED: Self = Self(1 << 2);
    pub const MULTICAST: Self = Self(1 << 3);
    pub const DISCOVERY: Self = Self(1 << 4);
    pub const OSCORE: Self = Self(1 << 5);
    pub const OSCORE_ENCRYPTED: Self = Self(1 << 6);
    pub const OSCORE_DECRYPTED: Self = Self(1 << 7);
    pub const ACCEPTED: Self = Self(1 << 8);
    pub const TCP: Self = Self(1 << 9);

    pub const NONE: Self = Self(0);

    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[must_use]
    pub const fn any(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl std::ops::BitOr for TransportFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for TransportFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

/// Either an IPv6 or an IPv4 socket address, as carried by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpAddrKind {
    V6(Ipv6Addr),
    V4(Ipv4Addr),
}

/// An OSCORE Sender ID: up to 13 bytes, stored inline to avoid heap churn
/// on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OscoreId {
    len: u8,
    bytes: [u8; OSCORE_ID_MAX_LEN],
}

impl OscoreId {
    pub fn new(raw: &[u8]) -> Option<Self> {
        if raw.len() > OSCORE_ID_MAX_LEN {
            return None;
        }
        let mut bytes = [0u8; OSCORE_ID_MAX_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Some(Self {
            len: raw.len() as u8,
            bytes,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// A network endpoint: the identity a message buffer is addressed to or
/// from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Index of the local device this endpoint is associated with (devices
    /// are indexed from 0; most deployments run exactly one).
    pub device_index: usize,
    pub flags: TransportFlags,
    pub local_port: u16,
    pub remote_addr: IpAddrKind,
    pub remote_port: u16,
    /// Index of the network interface this endpoint was seen on, used to
    /// join the correct multicast scope.
    pub interface_index: i32,
    /// OSCORE Sender ID of the remote peer, if this endpoint is secured.
    pub oscore_sender_id: Option<OscoreId>,
    /// Group address this endpoint is associated with, for matching a
    /// decrypted multicast message back to a local data-point mapping.
    pub group_address: Option<GroupAddress>,
    /// Index into the access-token table, or `None` if unauthenticated.
    pub auth_token_index: Option<usize>,
    /// Last-seen partial IV from this peer (informational; the replay
    /// filter is authoritative for accept/reject decisions).
    pub last_piv: Option<u64>,
}

impl Endpoint {
    pub fn new_v4(remote: Ipv4Addr, remote_port: u16, local_port: u16) -> Self {
        Self {
            device_index: 0,
            flags: TransportFlags::IPV4,
            local_port,
            remote_addr: IpAddrKind::V4(remote),
            remote_port,
            interface_index: -1,
            oscore_sender_id: None,
            group_address: None,
            auth_token_index: None,
            last_piv: None,
        }
    }

    pub fn new_v6(remote: Ipv6Addr, remote_port: u16, local_port: u16) -> Self {
        Self {
            device_index: 0,
            flags: TransportFlags::IPV6,
            local_port,
            remote_addr: IpAddrKind::V6(remote),
            remote_port,
            interface_index: -1,
            oscore_sender_id: None,
            group_address: None,
            auth_token_index: None,
            last_piv: None,
        }
    }

    pub fn is_multicast(&self) -> bool {
        self.flags.contains(TransportFlags::MULTICAST)
    }

    pub fn is_secured(&self) -> bool {
        self.flags.contains(TransportFlags::SECURED)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.remote_addr {
            IpAddrKind::V6(a) => write!(f, "[{a}]:{}", self.remote_port),
            IpAddrKind::V4(a) => write!(f, "{a}:{}", self.remote_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_flags_union_and_contains() {
        let f = TransportFlags::MULTICAST | TransportFlags::OSCORE;
        assert!(f.contains(TransportFlags::MULTICAST));
        assert!(f.contains(TransportFlags::OSCORE));
        assert!(!f.contains(TransportFlags::OSCORE_ENCRYPTED));
        assert!(f.any(TransportFlags::OSCORE_ENCRYPTED | TransportFlags::OSCORE));
    }

    #[test]
    fn oscore_id_rejects_oversized() {
        let ok = OscoreId::new(&[1, 2, 3]);
        assert!(ok.is_some());
        assert_eq!(ok.expect("some").as_slice(), &[1, 2, 3]);

        let too_big = [0u8; OSCORE_ID_MAX_LEN + 1];
        assert!(OscoreId::new(&too_big).is_none());
    }

    #[test]
    fn endpoint_display_formats_v4_and_v6() {
        let e4 = Endpoint::new_v4(Ipv4Addr::new(10, 0, 0, 1), 5683, 5683);
        assert_eq!(e4.to_string(), "10.0.0.1:5683");

        let e6 = Endpoint::new_v6(Ipv6Addr::LOCALHOST, 5684, 5684);
        assert_eq!(e6.to_string(), "[::1]:5684");
    }
}
