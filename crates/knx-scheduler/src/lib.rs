//! # knx-scheduler
//!
//! The cooperative event loop that ties the message-plane pipeline stages
//! together.
//!
//! Each **process** (buffer dispatch, CoAP engine, OSCORE-in/out, group
//! dispatch, network I/O) is an ordinary `tokio` task that owns a private
//! `mpsc::Receiver<Event>` and communicates exclusively by posting typed
//! [`Event`] values onto other processes' registered senders. Running every
//! such task on a `current_thread` runtime reproduces the original C
//! process model's "no process preempts another; a process yields to wait
//! for the next event" semantics: the runtime polls tasks cooperatively,
//! and each task's `await` on its inbound channel is its yield point. Only
//! buffer allocation and free (`knx-buffer`) cross real OS-thread
//! boundaries.
//!
//! [`EventRouter`] is the FIFO post office between processes.
//! [`TimerQueue`] is the monotonic-tick priority queue of timed callbacks
//! that the loop polls between event dispatches.

pub mod router;
pub mod timer;

pub use router::{EventRouter, PostError, ProcessId};
pub use timer::{CallbackOutcome, TimerId, TimerQueue};
