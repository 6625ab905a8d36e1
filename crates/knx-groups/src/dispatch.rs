//! Inbound group fan-out, outbound s-mode send, and group multicast
//! address derivation.

use std::net::Ipv6Addr;

use serde::{Deserialize, Serialize};

use knx_types::{GroupAddress, IndividualAddress};

use crate::cflags::CommFlags;
use crate::got::{GroupObjectEntry, GroupObjectTable};
use crate::rpt::{PublisherEntry, PublisherTarget, RecipientPublisherTable};

/// A synthesized local invocation produced by an inbound s-mode write: the
/// target href and the value to POST to it. The response is discarded by
/// the caller (the resource handler still runs exactly as for a unicast
/// POST).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundInvocation<'a> {
    pub href: &'a str,
}

/// Every table entry whose `ga` contains `group` and whose `cflags`
/// includes `WRITE` or `UPDATE`.
pub fn inbound_group_dispatch(table: &GroupObjectTable, group: GroupAddress) -> Vec<InboundInvocation<'_>> {
    table
        .entries()
        .filter(|e| e.ga.contains(&group) && e.cflags.any(CommFlags::WRITE | CommFlags::UPDATE))
        .map(|e| InboundInvocation { href: &e.href })
        .collect()
}

/// One outbound s-mode fan-out target: a unicast CoAP POST to an individual
/// address, a unicast POST to an explicit URL, or a multicast POST to the
/// derived group multicast address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundTarget {
    Unicast { ia: IndividualAddress, path: String },
    UnicastUrl(String),
    Multicast { address: Ipv6Addr, ga: GroupAddress },
}

/// The s-mode envelope body sent to every fan-out target: `{5: {4: sia, 7:
/// ga, 6: st, 1: value}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SModeEnvelope {
    pub sia: IndividualAddress,
    pub ga: GroupAddress,
    pub service_type: &'static str,
    pub value: Vec<u8>,
}

/// Locate every Group Object Table entry with `href == u`, then every
/// Recipient/Publisher entry matching one of its group addresses, and fan
/// out to each.
pub fn outbound_smode_targets(
    got: &GroupObjectTable,
    rpt: &RecipientPublisherTable,
    href: &str,
    local_iid_ula: [u8; 8],
) -> Vec<OutboundTarget> {
    let mut targets = Vec::new();
    for entry in matching_got_entries(got, href) {
        for &ga in &entry.ga {
            for publisher in rpt.by_group_address(ga) {
                targets.push(outbound_target_for(publisher, local_iid_ula));
            }
        }
    }
    targets
}

fn matching_got_entries<'a>(got: &'a GroupObjectTable, href: &str) -> impl Iterator<Item = &'a GroupObjectEntry> {
    got.entries().filter(move |e| e.href == href)
}

fn outbound_target_for(entry: &PublisherEntry, local_iid_ula: [u8; 8]) -> OutboundTarget {
    match &entry.target {
        PublisherTarget::Unicast { ia, path } => OutboundTarget::Unicast {
            ia: *ia,
            path: path.clone(),
        },
        PublisherTarget::Url(url) => OutboundTarget::UnicastUrl(url.clone()),
        PublisherTarget::Multicast { scope } => OutboundTarget::Multicast {
            address: group_multicast_address(local_iid_ula, entry.ga, *scope),
            ga: entry.ga,
        },
    }
}

/// Scope of a derived group multicast address: link-local reaches only the
/// sender's link, site-local reaches the whole KNX-IoT installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MulticastScope {
    Link,
    Site,
}

impl MulticastScope {
    fn digit(self) -> u8 {
        match self {
            MulticastScope::Link => 2,
            MulticastScope::Site => 5,
        }
    }
}

/// Derive the group multicast address `FF3{s}:30:<ULA prefix from
/// iid>:0:0:<ga>`.
pub fn group_multicast_address(local_iid_ula: [u8; 8], ga: GroupAddress, scope: MulticastScope) -> Ipv6Addr {
    let ga_bytes = ga.to_be_bytes();
    Ipv6Addr::new(
        0xFF30 | u16::from(scope.digit()),
        0x0030,
        u16::from_be_bytes([local_iid_ula[0], local_iid_ula[1]]),
        u16::from_be_bytes([local_iid_ula[2], local_iid_ula[3]]),
        0,
        0,
        u16::from_be_bytes([ga_bytes[0], ga_bytes[1]]),
        u16::from_be_bytes([ga_bytes[2], ga_bytes[3]]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use knx_storage::MemoryStorage;
    use knx_types::LoadState;

    fn sample_got() -> GroupObjectTable {
        let storage = MemoryStorage::default();
        let mut table = GroupObjectTable::new(crate::got::DEFAULT_CAPACITY);
        table
            .create_or_update(
                GroupObjectEntry { id: 1, href: "/p/1".into(), ga: vec![1], cflags: CommFlags::WRITE },
                LoadState::Loading,
                &storage,
            )
            .expect("create A");
        table
            .create_or_update(
                GroupObjectEntry {
                    id: 2,
                    href: "/p/2".into(),
                    ga: vec![1, 2],
                    cflags: CommFlags::READ,
                },
                LoadState::Loading,
                &storage,
            )
            .expect("create B");
        table
    }

    #[test]
    fn group_fan_out_invokes_only_the_writer() {
        let got = sample_got();
        let invocations = inbound_group_dispatch(&got, 1);
        assert_eq!(invocations, vec![InboundInvocation { href: "/p/1" }]);
    }

    #[test]
    fn group_address_not_present_in_any_entry_invokes_nothing() {
        let got = sample_got();
        assert!(inbound_group_dispatch(&got, 99).is_empty());
    }

    #[test]
    fn outbound_smode_fans_out_to_every_publisher_for_every_ga() {
        let storage = MemoryStorage::default();
        let got = sample_got();
        let mut rpt = RecipientPublisherTable::new(crate::rpt::DEFAULT_CAPACITY);
        rpt.create_or_update(
            PublisherEntry {
                id: 1,
                ga: 1,
                target: PublisherTarget::Unicast { ia: 0x1102, path: "/p/1".into() },
            },
            LoadState::Loading,
            &storage,
        )
        .expect("create publisher");

        let targets = outbound_smode_targets(&got, &rpt, "/p/1", [0xFD, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            targets,
            vec![OutboundTarget::Unicast { ia: 0x1102, path: "/p/1".into() }]
        );
    }

    #[test]
    fn multicast_address_uses_scope_ula_prefix_and_group_address() {
        let addr = group_multicast_address([0xFD, 0, 0, 0, 0, 0, 0, 1], 0x0102, MulticastScope::Site);
        assert_eq!(addr.segments()[0], 0xFF35);
        assert_eq!(addr.segments()[1], 0x0030);
        assert_eq!(addr.segments()[6], 0);
        assert_eq!(addr.segments()[7], 0x0102);
    }

    #[test]
    fn url_publisher_is_dispatched_as_unicast_to_that_url() {
        let storage = MemoryStorage::default();
        let got = sample_got();
        let mut rpt = RecipientPublisherTable::new(crate::rpt::DEFAULT_CAPACITY);
        rpt.create_or_update(
            PublisherEntry {
                id: 1,
                ga: 1,
                target: PublisherTarget::Url("coap://[fe80::1]/p/1".into()),
            },
            LoadState::Loading,
            &storage,
        )
        .expect("create publisher");

        let targets = outbound_smode_targets(&got, &rpt, "/p/1", [0xFD, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(targets, vec![OutboundTarget::UnicastUrl("coap://[fe80::1]/p/1".into())]);
    }

    #[test]
    fn multicast_publisher_derives_the_group_multicast_address() {
        let storage = MemoryStorage::default();
        let got = sample_got();
        let mut rpt = RecipientPublisherTable::new(crate::rpt::DEFAULT_CAPACITY);
        rpt.create_or_update(
            PublisherEntry {
                id: 1,
                ga: 1,
                target: PublisherTarget::Multicast { scope: MulticastScope::Site },
            },
            LoadState::Loading,
            &storage,
        )
        .expect("create publisher");

        let local_iid_ula = [0xFD, 0, 0, 0, 0, 0, 0, 1];
        let targets = outbound_smode_targets(&got, &rpt, "/p/1", local_iid_ula);
        assert_eq!(
            targets,
            vec![OutboundTarget::Multicast {
                address: group_multicast_address(local_iid_ula, 1, MulticastScope::Site),
                ga: 1,
            }]
        );
    }
}
