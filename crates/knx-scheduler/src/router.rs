//! FIFO event post office between scheduler processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use knx_types::Event;
use tokio::sync::mpsc;

/// Identifies a registered process mailbox.
pub type ProcessId = &'static str;

/// A post failed because the destination's queue was full.
///
/// A full output queue causes the dispatch stage to drop
/// the reference and log, not block: callers must treat `post` as
/// best-effort unless they are inside a reliable confirmed-message
/// transaction that owns its own retry policy.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("process {0:?} is not registered")]
    UnknownProcess(ProcessId),
    #[error("process {0:?}'s mailbox is full")]
    QueueFull(ProcessId),
    #[error("process {0:?}'s mailbox is closed")]
    Closed(ProcessId),
}

/// The FIFO router between scheduler processes.
///
/// Each process registers a bounded mailbox at startup and is handed the
/// matching `Receiver` to drive its own task loop; any process can then
/// post events to any other registered process by name.
#[derive(Clone, Default)]
pub struct EventRouter {
    mailboxes: Arc<Mutex<HashMap<ProcessId, mpsc::Sender<Event>>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new process mailbox with the given bound, returning the
    /// receiver the process should poll in its own task loop.
    pub fn register(&self, id: ProcessId, capacity: usize) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(capacity);
        self.mailboxes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id, tx);
        rx
    }

    /// Post an event to a registered process. Non-blocking: if the
    /// destination mailbox is full, returns `Err` immediately rather than
    /// waiting, so the caller can drop its buffer reference and log.
    pub fn post(&self, id: ProcessId, event: Event) -> Result<(), PostError> {
        let sender = {
            let mailboxes = self
                .mailboxes
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            mailboxes
                .get(id)
                .cloned()
                .ok_or(PostError::UnknownProcess(id))?
        };
        match sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(process = id, "mailbox full, dropping event");
                Err(PostError::QueueFull(id))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PostError::Closed(id)),
        }
    }
}
