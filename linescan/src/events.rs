//! Channel-based notifications from the pipeline to its consumers.
//!
//! The pipeline never mutates consumer-visible state directly. It emits
//! events onto subscriber channels; each consumer drains its own
//! receiver on its own thread.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use tracing::trace;

use crate::search::RunState;

/// Notification emitted by the search pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// The run moved to a new lifecycle state
    StateChanged(RunState),
    /// A worker appended a matching line
    MatchFound(String),
    /// The runtime clock advanced; carries total elapsed seconds
    Tick(u64),
}

/// Fan-out registry of event subscribers.
///
/// Subscribers that drop their receiver are pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    senders: Mutex<Vec<Sender<ScanEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a new subscriber and returns its receiving end
    pub fn subscribe(&self) -> Receiver<ScanEvent> {
        let (tx, rx) = channel();
        self.senders.lock().unwrap().push(tx);
        rx
    }

    /// Broadcasts `event` to all live subscribers
    pub fn emit(&self, event: ScanEvent) {
        trace!("emitting {:?}", event);
        let mut senders = self.senders.lock().unwrap();
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
