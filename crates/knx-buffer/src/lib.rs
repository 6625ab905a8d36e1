//! # knx-buffer
//!
//! The persistent, bounded, pooled message-buffer allocator shared by the
//! I/O, CoAP, OSCORE, and application stages.
//!
//! A [`BufferPool`] bounds the number of concurrently in-flight buffers.
//! [`BufferPool::allocate`] takes the pool's allocation mutex, checks the
//! bound, and hands back a [`MessageBuffer`] — a reference-counted handle
//! around the payload, its endpoint, and its transport flags. Cloning a
//! handle increments the reference count without taking any lock (the
//! increment is a plain `Arc` clone); dropping the last handle releases the
//! slot back to the pool under the same mutex used at allocation.
//!
//! This mirrors the C source's explicit `ref()`/`unref()` discipline while
//! expressing it through Rust's ordinary `Clone`/`Drop`, so the invariant
//! "no buffer is freed while its ref count is > 0; no double-free" is enforced by the type system rather than by convention.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use knx_types::{Endpoint, TransportFlags};

/// Errors raised by buffer-pool operations.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// The pool has reached its configured capacity; the I/O stage must
    /// drop the inbound datagram.
    #[error("buffer pool exhausted: {in_use}/{capacity} slots in use")]
    PoolExhausted { in_use: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, BufferError>;

/// A bounded pool of message buffers.
///
/// Backing is always heap-allocated (`Vec<u8>`). A fixed-pool-vs-dynamic
/// distinction is a build-time policy on embedded targets and is not
/// meaningful for a hosted Rust binary, so only the dynamic policy is
/// implemented (see DESIGN.md).
pub struct BufferPool {
    capacity: usize,
    pdu_size: usize,
    in_use: Mutex<usize>,
    next_id: AtomicU64,
}

impl BufferPool {
    /// Create a new pool bounding concurrently in-flight buffers to
    /// `capacity`, each able to hold up to `pdu_size` bytes of payload.
    pub fn new(capacity: usize, pdu_size: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            pdu_size,
            in_use: Mutex::new(0),
            next_id: AtomicU64::new(0),
        })
    }

    /// Allocate a new buffer. Takes the pool's allocation mutex; fails
    /// closed (returns `Err`) if the pool is at capacity, rather than
    /// growing unbounded.
    pub fn allocate(self: &Arc<Self>) -> Result<MessageBuffer> {
        let mut in_use = self
            .in_use
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *in_use >= self.capacity {
            return Err(BufferError::PoolExhausted {
                in_use: *in_use,
                capacity: self.capacity,
            });
        }
        *in_use += 1;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        drop(in_use);

        Ok(MessageBuffer {
            inner: Arc::new(Mutex::new(Inner {
                pool: self.clone(),
                id,
                payload: Vec::with_capacity(self.pdu_size.min(4096)),
                endpoint: None,
                flags: TransportFlags::empty(),
            })),
        })
    }

    /// Number of buffer slots currently in use. Used by tests asserting
    /// that the pool returns to baseline after each fully-processed
    /// datagram.
    pub fn in_use_count(&self) -> usize {
        *self
            .in_use
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pdu_size(&self) -> usize {
        self.pdu_size
    }

    fn release(&self, id: u64) {
        let mut in_use = self
            .in_use
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *in_use = in_use.saturating_sub(1);
        tracing::debug!(buffer_id = id, in_use = *in_use, "released buffer slot");
    }
}

struct Inner {
    pool: Arc<BufferPool>,
    id: u64,
    payload: Vec<u8>,
    endpoint: Option<Endpoint>,
    flags: TransportFlags,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.pool.release(self.id);
    }
}

/// A reference-counted handle to a pooled message buffer.
///
/// Cloning bumps the reference count (an ordinary atomic `Arc` increment,
/// no lock taken). The last clone to drop releases the slot back to the
/// pool under the pool's allocation mutex.
#[derive(Clone)]
pub struct MessageBuffer {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("id", &self.id())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

impl MessageBuffer {
    /// Stable identifier for this buffer slot, used to correlate pipeline
    /// events with the buffer they carry.
    pub fn id(&self) -> u64 {
        self.lock().id
    }

    /// Explicit reference increment, named to match the C source's `ref()`
    /// vocabulary. Equivalent to [`Clone::clone`].
    pub fn acquire_ref(&self) -> Self {
        self.clone()
    }

    /// Explicit reference decrement, named to match the C source's
    /// `unref()` vocabulary. Consumes this handle; when it was the last
    /// live handle the slot is released back to the pool immediately.
    pub fn unref(self) {
        drop(self);
    }

    /// Number of live handles referencing this buffer (for tests only;
    /// production code must never branch on this to decide liveness — use
    /// `unref` and let `Drop` decide).
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn len(&self) -> usize {
        self.lock().payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_payload(&self, data: &[u8]) {
        self.lock().payload = data.to_vec();
    }

    pub fn payload(&self) -> Vec<u8> {
        self.lock().payload.clone()
    }

    pub fn with_payload<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.lock().payload)
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.lock().endpoint.clone()
    }

    pub fn set_endpoint(&self, endpoint: Endpoint) {
        self.lock().endpoint = Some(endpoint);
    }

    pub fn flags(&self) -> TransportFlags {
        self.lock().flags
    }

    pub fn set_flags(&self, flags: TransportFlags) {
        self.lock().flags = flags;
    }

    pub fn add_flags(&self, flags: TransportFlags) {
        self.lock().flags.insert(flags);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
