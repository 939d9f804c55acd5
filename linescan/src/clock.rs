//! One-second runtime ticker.
//!
//! The clock runs on its own thread, never on the worker pool, so ticks
//! are not delayed by search workload. It increments a shared counter
//! once per second and freezes at the current value when stopped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::trace;

use crate::events::{EventBus, ScanEvent};

const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct RuntimeClock;

impl RuntimeClock {
    /// Resets `elapsed` to zero and starts a dedicated ticker thread.
    ///
    /// Each tick increments `elapsed` and emits `ScanEvent::Tick` on the
    /// bus. Ticking stops when the returned handle is stopped or dropped.
    pub fn start(elapsed: Arc<AtomicU64>, bus: Arc<EventBus>) -> ClockHandle {
        elapsed.store(0, Ordering::SeqCst);
        let (shutdown, rx) = channel();

        let thread = std::thread::spawn(move || loop {
            match rx.recv_timeout(TICK_PERIOD) {
                Err(RecvTimeoutError::Timeout) => {
                    let seconds = elapsed.fetch_add(1, Ordering::SeqCst) + 1;
                    trace!("runtime clock tick: {}s", seconds);
                    bus.emit(ScanEvent::Tick(seconds));
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        ClockHandle {
            shutdown,
            thread: Some(thread),
        }
    }
}

/// Handle to a running ticker thread
#[derive(Debug)]
pub struct ClockHandle {
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl ClockHandle {
    /// Stops the ticker and waits for the thread to exit. Any tick that
    /// would have fired after this call is cancelled, not delivered late.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.halt();
    }
}
