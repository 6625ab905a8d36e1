//! knx-daemon: the KNX-IoT device message-plane daemon.
//!
//! Single OS process running a Tokio async runtime: a UDP receive loop
//! admits inbound datagrams through the CoAP engine's duplicate-suppression
//! and Echo-freshness pipeline, and a periodic housekeeping task scrubs
//! expired transaction/block-wise/retransmit state. The two tasks share
//! state behind `Mutex` rather than posting typed events through
//! `knx_scheduler::EventRouter`; see DESIGN.md for why the simpler model
//! was chosen for this binary.

mod config;
mod reset;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use knx_buffer::BufferPool;
use knx_coap::CoapEngine;
use knx_groups::{GroupObjectTable, RecipientPublisherTable};
use knx_storage::{SqliteStorage, Storage};
use knx_types::LoadState;

use crate::config::DeviceConfig;

/// Daemon-wide shared state handed to every task.
struct DeviceState {
    config: DeviceConfig,
    storage: Arc<dyn Storage>,
    buffers: Arc<BufferPool>,
    engine: Mutex<CoapEngine>,
    got: Mutex<GroupObjectTable>,
    rpt: Mutex<RecipientPublisherTable>,
    load_state: Mutex<LoadState>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DeviceConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(hostname = %config.identity.hostname, "knx-daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(&config.sqlite_path())?);

    if let Ok(code) = std::env::var("KNX_FACTORY_RESET") {
        if let Ok(raw) = code.parse::<u8>() {
            if let Ok(reset_code) = knx_types::ResetCode::try_from(raw) {
                reset::factory_reset(storage.as_ref(), reset_code)?;
            } else {
                warn!(code = raw, "ignoring unknown factory reset code");
            }
        }
    }

    let mut got = GroupObjectTable::new(config.pools.group_object_table_capacity);
    got.reload(storage.as_ref())?;
    let mut rpt = RecipientPublisherTable::new(config.pools.recipient_publisher_table_capacity);
    rpt.reload(storage.as_ref())?;

    let buffers = BufferPool::new(config.pools.buffer_count, config.pools.pdu_size);
    let engine = CoapEngine::new(config.pools.replay_pool_size);

    let state = Arc::new(DeviceState {
        config: config.clone(),
        storage,
        buffers,
        engine: Mutex::new(engine),
        got: Mutex::new(got),
        rpt: Mutex::new(rpt),
        load_state: Mutex::new(LoadState::Unloaded),
    });

    let bind_addr: SocketAddr = format!("[::]:{}", state.config.network.port).parse()?;
    let socket = Arc::new(UdpSocket::bind(bind_addr).await?);
    info!(%bind_addr, "listening for CoAP datagrams");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let scrub_task = tokio::spawn(scrub_loop(state.clone(), shutdown_tx.subscribe()));
    let io_task = tokio::spawn(io_loop(state.clone(), socket, shutdown_tx.subscribe()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
        }
    }

    let _ = shutdown_tx.send(());
    let _ = scrub_task.await;
    let _ = io_task.await;

    info!("knx-daemon stopped");
    Ok(())
}

/// Periodically sweep the dedup/transaction/block-wise/replay tables for
/// expired entries, mirroring the cooperative loop's timer-driven
/// housekeeping pass.
async fn scrub_loop(state: Arc<DeviceState>, mut shutdown: broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut engine = state.engine.lock().await;
                engine.scrub(std::time::Instant::now());
            }
            _ = shutdown.recv() => break,
        }
    }
}

/// Receive inbound datagrams into pooled buffers and hand them to the CoAP
/// engine's dedup/freshness pipeline. Decryption, routing, and response
/// encoding are left to the `knx-oscore`/`knx-router`/`knx-groups` stages
/// this loop would post events to on a fuller build-out; this pass focuses
/// on the transport-facing admission path.
async fn io_loop(state: Arc<DeviceState>, socket: Arc<UdpSocket>, mut shutdown: broadcast::Receiver<()>) {
    let mut scratch = vec![0u8; state.config.pools.pdu_size];
    loop {
        tokio::select! {
            result = socket.recv_from(&mut scratch) => {
                match result {
                    Ok((len, from)) => handle_datagram(&state, &scratch[..len], from).await,
                    Err(e) => error!(error = %e, "udp recv failed"),
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

async fn handle_datagram(state: &Arc<DeviceState>, bytes: &[u8], from: SocketAddr) {
    let buffer = match state.buffers.allocate() {
        Ok(buf) => buf,
        Err(e) => {
            warn!(error = %e, %from, "dropping inbound datagram, buffer pool exhausted");
            return;
        }
    };
    buffer.set_payload(bytes);

    let packet = match knx_coap::CoapPacket::decode(bytes) {
        Ok(packet) => packet,
        Err(e) => {
            warn!(error = %e, %from, "dropping malformed CoAP datagram");
            buffer.unref();
            return;
        }
    };

    let endpoint = endpoint_from_socket_addr(from);
    let mut engine = state.engine.lock().await;
    match engine.observe_inbound(&packet, &endpoint) {
        knx_coap::InboundOutcome::Fresh => {
            drop(engine);
            tracing::debug!(%from, message_id = packet.message_id, "admitted fresh request");
        }
        knx_coap::InboundOutcome::DuplicateSuppressed => {
            tracing::debug!(%from, message_id = packet.message_id, "suppressed duplicate");
        }
        knx_coap::InboundOutcome::DuplicateWithCachedResponse(_) => {
            tracing::debug!(%from, message_id = packet.message_id, "retransmitted cached response");
        }
    }
    buffer.unref();
}

fn endpoint_from_socket_addr(addr: SocketAddr) -> knx_types::Endpoint {
    match addr {
        SocketAddr::V4(a) => knx_types::Endpoint::new_v4(*a.ip(), a.port(), a.port()),
        SocketAddr::V6(a) => knx_types::Endpoint::new_v6(*a.ip(), a.port(), a.port()),
    }
}
