//! End-to-end: a retransmitted Confirmable request is suppressed while its
//! original is still in flight, and resends the cached response once one
//! exists; a block-wise request is reassembled across multiple datagrams.

use std::net::Ipv4Addr;

use knx_coap::packet::{BlockValue, CoapCode, CoapPacket, CoapType};
use knx_coap::{CoapEngine, InboundOutcome};
use knx_coap::blockwise::Role;
use knx_buffer::BufferPool;
use knx_types::Endpoint;

fn endpoint() -> Endpoint {
    Endpoint::new_v4(Ipv4Addr::new(192, 168, 1, 50), 5683, 5683)
}

#[test]
fn retransmit_before_response_is_suppressed_then_resent_once_cached() {
    let mut engine = CoapEngine::new(20);
    let ep = endpoint();
    let pool = BufferPool::new(4, 512);
    let request = CoapPacket::new_request(CoapType::Confirmable, CoapCode::GET, 77, vec![0x10]);

    assert!(matches!(engine.observe_inbound(&request, &ep), InboundOutcome::Fresh));
    assert!(matches!(
        engine.observe_inbound(&request, &ep),
        InboundOutcome::DuplicateSuppressed
    ));

    let response = pool.allocate().expect("allocate response buffer");
    response.set_payload(b"2.05 content");
    engine.cache_for_possible_retransmit(vec![0x10], response);

    match engine.observe_inbound(&request, &ep) {
        InboundOutcome::DuplicateWithCachedResponse(buf) => {
            assert_eq!(buf.payload(), b"2.05 content");
        }
        other => panic!("expected a cached response resend, got {other:?}"),
    }
}

#[test]
fn blockwise_post_reassembles_across_multiple_blocks() {
    let mut engine = CoapEngine::new(20);
    let token = vec![0x22];
    engine.start_incoming_blockwise(Role::ServerIncoming, "/fp/r".into(), CoapCode::POST.detail, token.clone());

    let chunk_a = vec![1u8; 16];
    let chunk_b = vec![2u8; 16];
    let chunk_c = vec![3u8; 4];

    assert!(!engine
        .append_incoming_block("/fp/r", &token, BlockValue { num: 0, more: true, szx: 2 }, &chunk_a)
        .expect("append block 0"));
    assert!(!engine
        .append_incoming_block("/fp/r", &token, BlockValue { num: 1, more: true, szx: 2 }, &chunk_b)
        .expect("append block 1"));
    assert!(engine
        .append_incoming_block("/fp/r", &token, BlockValue { num: 2, more: false, szx: 2 }, &chunk_c)
        .expect("append final block"));

    let reassembled = engine.finish_incoming_blockwise("/fp/r", &token).expect("payload");
    let mut expected = chunk_a;
    expected.extend(chunk_b);
    expected.extend(chunk_c);
    assert_eq!(reassembled, expected);
}
