//! Top-level state machine coordinating one search run:
//! load, shuffle, partition, dispatch, aggregate, finish or cancel.
//!
//! Only the orchestrator mutates the run state; workers just scan and
//! signal completion by returning. Cancellation is cooperative: each
//! worker checks a per-run flag once per line, and `stop` abandons the
//! worker pool instead of draining it.

use std::ops::Range;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::clock::{ClockHandle, RuntimeClock};
use crate::config::SearchConfig;
use crate::corpus;
use crate::errors::{ScanError, ScanResult};
use crate::events::{EventBus, ScanEvent};
use crate::results::MatchSink;
use crate::search::matcher::LineMatcher;

/// Lifecycle of one search run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Loading,
    Searching,
    Finished,
    Error,
    Cancelled,
}

impl RunState {
    /// True while a run is in flight; `start` is rejected in these states
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Loading | RunState::Searching)
    }

    /// Human-readable status for the consumer
    pub fn status_text(self) -> &'static str {
        match self {
            RunState::Stopped => "STOPPED",
            RunState::Loading => "LOADING",
            RunState::Searching => "SEARCHING",
            RunState::Finished => "FINISHED",
            RunState::Error => "UNABLE TO LOAD STRINGS",
            // A cancelled run reads as stopped to the consumer.
            RunState::Cancelled => "STOPPED",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status_text())
    }
}

/// State observable by the consumer, shared across runs
#[derive(Debug)]
struct Shared {
    state: Mutex<RunState>,
    results: Mutex<MatchSink>,
    elapsed: Arc<AtomicU64>,
    bus: Arc<EventBus>,
}

/// Per-run cancellation flag plus the run's clock handle.
///
/// Each run gets a fresh control, so a stale pipeline from a cancelled
/// run can never complete a state transition or stop the next run's
/// clock.
#[derive(Debug, Default)]
struct RunControl {
    cancelled: AtomicBool,
    clock: Mutex<Option<ClockHandle>>,
}

impl RunControl {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn stop_clock(&self) {
        if let Some(clock) = self.clock.lock().unwrap().take() {
            clock.stop();
        }
    }
}

/// Resources owned for the duration of one run
#[derive(Debug)]
struct ActiveRun {
    control: Arc<RunControl>,
    pool: Option<Arc<rayon::ThreadPool>>,
}

/// Coordinates the whole pipeline and exposes the observable state.
///
/// `start` returns immediately; loading and scanning happen on a worker
/// pool created per run and discarded when the run ends. Consumers
/// observe progress through the accessors or by subscribing to events.
#[derive(Debug, Clone)]
pub struct Searcher {
    shared: Arc<Shared>,
    run: Arc<Mutex<Option<ActiveRun>>>,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Searcher {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(RunState::Stopped),
                results: Mutex::new(MatchSink::new()),
                elapsed: Arc::new(AtomicU64::new(0)),
                bus: Arc::new(EventBus::new()),
            }),
            run: Arc::new(Mutex::new(None)),
        }
    }

    /// Begins a new run.
    ///
    /// Rejects invalid configurations synchronously, before any state
    /// transition, and rejects a second start while a run is active.
    /// All state from the previous run (results, elapsed time, worker
    /// pool) is discarded.
    pub fn start(&self, config: SearchConfig) -> ScanResult<()> {
        config.validate()?;
        let workers = config.worker_count.get();

        let mut run_guard = self.run.lock().unwrap();
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.is_active() {
                return Err(ScanError::AlreadyRunning);
            }
            *state = RunState::Loading;
            // Emitted under the state lock so subscribers see state
            // events in the same order the transitions happen. The bus
            // lock is a leaf; nothing takes the state lock while
            // emitting.
            self.shared.bus.emit(ScanEvent::StateChanged(RunState::Loading));
        }

        // Fresh sink per run; abandoned workers from an earlier run keep
        // their own sink and can never write into this one.
        let sink = MatchSink::new();
        *self.shared.results.lock().unwrap() = sink.clone();

        let control = Arc::new(RunControl::default());
        let clock = RuntimeClock::start(
            Arc::clone(&self.shared.elapsed),
            Arc::clone(&self.shared.bus),
        );
        *control.clock.lock().unwrap() = Some(clock);

        // One extra slot so the load/shuffle/dispatch task does not
        // starve the search workers while it waits on them.
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers + 1)
            .thread_name(|i| format!("linescan-worker-{}", i))
            .build()
        {
            Ok(pool) => Arc::new(pool),
            Err(e) => {
                control.stop_clock();
                let mut state = self.shared.state.lock().unwrap();
                *state = RunState::Stopped;
                self.shared
                    .bus
                    .emit(ScanEvent::StateChanged(RunState::Stopped));
                drop(state);
                return Err(ScanError::pool_error(e.to_string()));
            }
        };

        info!(
            "starting search for {:?} in {} with {} workers",
            config.query,
            config.file_path.display(),
            workers
        );

        let shared = Arc::clone(&self.shared);
        let pipeline_control = Arc::clone(&control);
        let matcher = LineMatcher::new(&config.query);
        let path = config.file_path.clone();
        pool.spawn(move || {
            run_pipeline(shared, pipeline_control, sink, matcher, path, workers)
        });

        *run_guard = Some(ActiveRun {
            control,
            pool: Some(pool),
        });
        Ok(())
    }

    /// Cancels the active run, if any. Idempotent: a second stop, or a
    /// stop while no run is active, is a no-op.
    ///
    /// Cancellation is forceful at the run level: in-flight ranges are
    /// abandoned, the pool is discarded, and whatever was appended
    /// before the cancel stays visible until the next start. Workers
    /// notice the cancel flag between lines, so a load already in
    /// progress still reads the whole file on the abandoned pool; the
    /// observable state flips to cancelled immediately regardless.
    pub fn stop(&self) {
        let mut run_guard = self.run.lock().unwrap();
        let Some(run) = run_guard.as_mut() else {
            return;
        };

        {
            let mut state = self.shared.state.lock().unwrap();
            if !state.is_active() {
                return;
            }
            run.control.cancel();
            *state = RunState::Cancelled;
            self.shared
                .bus
                .emit(ScanEvent::StateChanged(RunState::Cancelled));
        }
        run.control.stop_clock();

        let pool = run.pool.take();
        drop(run_guard);
        drop(pool);
        info!("search cancelled");
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        *self.shared.state.lock().unwrap()
    }

    /// Status label for the current state
    pub fn status_text(&self) -> &'static str {
        self.state().status_text()
    }

    /// True while a run is loading or searching
    pub fn is_running(&self) -> bool {
        self.state().is_active()
    }

    /// Seconds the current (or last) run has been active
    pub fn elapsed_seconds(&self) -> u64 {
        self.shared.elapsed.load(Ordering::SeqCst)
    }

    /// Snapshot of the matches found so far, in arrival order
    pub fn results(&self) -> Vec<String> {
        self.shared.results.lock().unwrap().snapshot()
    }

    /// Number of matches found so far
    pub fn match_count(&self) -> usize {
        self.shared.results.lock().unwrap().len()
    }

    /// Registers an event subscriber; drain the receiver on the
    /// consumer's own thread
    pub fn subscribe(&self) -> Receiver<ScanEvent> {
        self.shared.bus.subscribe()
    }
}

/// Load, shuffle, dispatch, and join one run. Runs on the extra pool
/// slot; the `rayon::scope` below occupies it while the workers scan.
fn run_pipeline(
    shared: Arc<Shared>,
    control: Arc<RunControl>,
    sink: MatchSink,
    matcher: LineMatcher,
    path: PathBuf,
    workers: usize,
) {
    let mut lines = match corpus::load_lines(&path) {
        Ok(lines) => lines,
        Err(e) => {
            warn!("unable to load {}: {}", path.display(), e);
            if transition(&shared, &control, RunState::Error) {
                control.stop_clock();
            }
            return;
        }
    };

    corpus::shuffle_lines(&mut lines);
    if !transition(&shared, &control, RunState::Searching) {
        // Cancelled while loading; nothing was dispatched.
        return;
    }

    let lines = Arc::new(lines);
    let ranges = corpus::chunk_ranges(lines.len(), workers);
    debug!("dispatching {} workers over {} lines", workers, lines.len());

    rayon::scope(|s| {
        for range in ranges {
            let lines = Arc::clone(&lines);
            let sink = sink.clone();
            let control = Arc::clone(&control);
            let matcher = matcher.clone();
            let bus = Arc::clone(&shared.bus);
            s.spawn(move |_| scan_range(&lines, range, &matcher, &sink, &control, &bus));
        }
    });

    if transition(&shared, &control, RunState::Finished) {
        control.stop_clock();
        info!("search finished with {} matches", sink.len());
    }
}

/// One worker's scan over its assigned index range. The corpus is
/// read-only; the sink append is the only synchronized operation.
fn scan_range(
    lines: &[String],
    range: Range<usize>,
    matcher: &LineMatcher,
    sink: &MatchSink,
    control: &RunControl,
    bus: &EventBus,
) {
    for idx in range {
        if control.is_cancelled() {
            debug!("worker abandoning range at index {}", idx);
            return;
        }
        let line = &lines[idx];
        if matcher.is_match(line) {
            sink.push(line.clone());
            bus.emit(ScanEvent::MatchFound(line.clone()));
        }
    }
}

/// Applies a state transition unless this run has been cancelled. The
/// cancel flag is read, and the event emitted, under the state lock:
/// a transition and a concurrent `stop` are fully serialized, and the
/// event stream observes states in transition order.
fn transition(shared: &Shared, control: &RunControl, next: RunState) -> bool {
    let mut state = shared.state.lock().unwrap();
    if control.is_cancelled() {
        return false;
    }
    *state = next;
    shared.bus.emit(ScanEvent::StateChanged(next));
    true
}
