//! End-to-end: a peer that has never sent a request is challenged with
//! Echo, synchronizes on retry, and a later replayed sequence number (or a
//! stale Echo value) is rejected/re-challenged rather than silently
//! accepted.

use knx_coap::{CoapEngine, FreshnessDecision};
use knx_oscore::{EchoChallenge, PeerKey};

#[test]
fn unsynchronized_peer_is_challenged_then_proceeds_then_cannot_replay() {
    let mut engine = CoapEngine::new(20);
    let peer = PeerKey::new(vec![0xAA, 0xBB], None);
    let t0 = 1_700_000_000u64;

    let challenge = match engine.check_freshness(&peer, 42, None, t0) {
        FreshnessDecision::Challenge(c) => c,
        other => panic!("expected a challenge for an unknown peer, got {other:?}"),
    };

    let synced = engine.check_freshness(&peer, 42, Some(&challenge.to_bytes()), t0 + 1);
    assert_eq!(synced, FreshnessDecision::Proceed);

    let replayed = engine.check_freshness(&peer, 42, None, t0 + 2);
    assert_eq!(replayed, FreshnessDecision::Reject);
}

#[test]
fn stale_echo_value_forces_a_fresh_challenge_instead_of_accepting() {
    let mut engine = CoapEngine::new(20);
    let peer = PeerKey::new(vec![0x01], None);
    let t0 = 1_700_000_000u64;
    let stale = EchoChallenge::issue_at(t0);

    let decision = engine.check_freshness(&peer, 1, Some(&stale.to_bytes()), t0 + 20);
    let reissued = match decision {
        FreshnessDecision::Challenge(c) => c,
        other => panic!("expected a fresh challenge, got {other:?}"),
    };

    let synced = engine.check_freshness(&peer, 1, Some(&reissued.to_bytes()), t0 + 21);
    assert_eq!(synced, FreshnessDecision::Proceed);
}
