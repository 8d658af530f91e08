//! Periodic refresh of the Log Store.
//!
//! A [`Poller`] owns a background thread that polls once immediately and then
//! on a fixed interval, replacing the store wholesale on every success. Its
//! lifetime is tied to the surface that started it:
//! [`stop`](Poller::stop) (or dropping the poller) ends the schedule and no
//! further requests are issued.
//!
//! The loop is sequential, so two polls never overlap. A tick that comes due
//! while a request is still in flight is skipped rather than queued, and the
//! skip is recorded in diagnostics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::api::LogApi;
use crate::diagnostics::Diagnostics;
use crate::logs::{InteractionLog, LogStore};

// ---------------------------------------------------------------------------
// Single poll
// ---------------------------------------------------------------------------

/// Result of one poll attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The store now holds this many records.
    Refreshed(usize),
    /// The request failed; the store is unchanged.
    Failed,
}

/// Fetch the full collection once and install it in `store`.
///
/// On failure the store is left exactly as it was and the error goes to
/// `diagnostics` only.
pub fn poll_once(api: &dyn LogApi, store: &LogStore, diagnostics: &Diagnostics) -> PollOutcome {
    apply_poll(api.fetch_logs(), store, diagnostics)
}

fn apply_poll(
    result: anyhow::Result<Vec<InteractionLog>>,
    store: &LogStore,
    diagnostics: &Diagnostics,
) -> PollOutcome {
    match result {
        Ok(records) => {
            let count = records.len();
            store.replace_all(records);
            PollOutcome::Refreshed(count)
        }
        Err(e) => {
            diagnostics.poll_failure(&e);
            PollOutcome::Failed
        }
    }
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Notification sent to the owning surface after each poll attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    Polled(PollOutcome),
}

/// Callback invoked on the poll thread after every attempt.
pub type PollListener = Box<dyn Fn(PollEvent) + Send>;

/// Counters describing the loop so far.
#[derive(Debug, Default)]
pub struct PollStats {
    attempts: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

impl PollStats {
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Ticks dropped because the previous poll had not finished.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Everything the poll thread needs.
pub struct PollerSetup {
    pub api: Arc<dyn LogApi>,
    pub store: LogStore,
    pub diagnostics: Diagnostics,
    pub interval: Duration,
    /// Called after every attempt, if set.
    pub notify: Option<PollListener>,
}

/// Handle to a running poll loop.
pub struct Poller {
    stop_tx: Option<Sender<()>>,
    stopped: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<PollStats>,
}

impl Poller {
    /// Start polling: once now, then every `setup.interval`.
    pub fn start(setup: PollerSetup) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let stopped = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(PollStats::default());

        let handle = {
            let stopped = Arc::clone(&stopped);
            let stats = Arc::clone(&stats);
            thread::spawn(move || run_loop(setup, stop_rx, stopped, stats))
        };

        Self {
            stop_tx: Some(stop_tx),
            stopped,
            handle: Some(handle),
            stats,
        }
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Cancel the schedule and wait for the poll thread to exit.
    ///
    /// A request already in flight is not aborted; its result is discarded.
    pub fn stop(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn signal_stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        // Dropping the sender wakes the loop with `Disconnected`.
        self.stop_tx.take();
    }
}

impl Drop for Poller {
    /// Cancels the schedule without blocking on an in-flight request. The
    /// thread exits on its own once that request returns.
    fn drop(&mut self) {
        self.signal_stop();
    }
}

fn run_loop(
    setup: PollerSetup,
    stop_rx: mpsc::Receiver<()>,
    stopped: Arc<AtomicBool>,
    stats: Arc<PollStats>,
) {
    let PollerSetup {
        api,
        store,
        diagnostics,
        interval,
        notify,
    } = setup;
    // A zero interval would spin the catch-up loop below.
    let interval = interval.max(Duration::from_millis(1));

    let mut next_tick = Instant::now();

    loop {
        stats.attempts.fetch_add(1, Ordering::Relaxed);
        let result = api.fetch_logs();
        // Teardown happened while the request was in flight.
        if stopped.load(Ordering::SeqCst) {
            return;
        }
        let outcome = apply_poll(result, &store, &diagnostics);
        if outcome == PollOutcome::Failed {
            stats.failures.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(listener) = &notify {
            listener(PollEvent::Polled(outcome));
        }

        next_tick += interval;
        let now = Instant::now();
        let mut missed = 0u32;
        while next_tick <= now {
            next_tick += interval;
            missed += 1;
        }
        if missed > 0 {
            stats.skipped.fetch_add(u64::from(missed), Ordering::Relaxed);
            diagnostics.poll_skipped(missed);
        }

        match stop_rx.recv_timeout(next_tick - now) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc::Receiver;

    use super::*;
    use crate::diagnostics::{self, EventKind};
    use crate::logs::Feedback;

    struct ScriptedApi {
        responses: Mutex<Vec<anyhow::Result<Vec<InteractionLog>>>>,
    }

    impl LogApi for ScriptedApi {
        fn fetch_logs(&self) -> anyhow::Result<Vec<InteractionLog>> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }

        fn send_feedback(&self, _id: &str, _feedback: Feedback) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Every fetch takes `delay`; tracks how many fetches run at once.
    struct SlowApi {
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl SlowApi {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    impl LogApi for SlowApi {
        fn fetch_logs(&self) -> anyhow::Result<Vec<InteractionLog>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![record("1")])
        }

        fn send_feedback(&self, _id: &str, _feedback: Feedback) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// A fetch reports that it started, then blocks until released.
    struct GatedApi {
        started: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl LogApi for GatedApi {
        fn fetch_logs(&self) -> anyhow::Result<Vec<InteractionLog>> {
            let _ = self.started.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            Ok(vec![record("late")])
        }

        fn send_feedback(&self, _id: &str, _feedback: Feedback) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn record(id: &str) -> InteractionLog {
        InteractionLog {
            id: id.to_string(),
            timestamp: "2026-10-17 08:00:00".to_string(),
            user_id: "u".to_string(),
            question: "q".to_string(),
            answer: "a".to_string(),
            duration: 10,
            feedback: None,
        }
    }

    #[test]
    fn poll_once_installs_records() {
        let api = ScriptedApi {
            responses: Mutex::new(vec![Ok(vec![record("1"), record("2")])]),
        };
        let store = LogStore::new();
        let outcome = poll_once(&api, &store, &Diagnostics::disabled());
        assert_eq!(outcome, PollOutcome::Refreshed(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn poll_once_failure_keeps_store() {
        let api = ScriptedApi {
            responses: Mutex::new(vec![Err(anyhow::anyhow!("boom"))]),
        };
        let store = LogStore::new();
        store.replace_all(vec![record("keep")]);
        let before = store.snapshot();

        let outcome = poll_once(&api, &store, &Diagnostics::disabled());
        assert_eq!(outcome, PollOutcome::Failed);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn loop_polls_immediately_and_notifies() {
        let api = Arc::new(ScriptedApi {
            responses: Mutex::new(vec![Ok(vec![record("1")])]),
        });
        let store = LogStore::new();
        let (tx, rx) = mpsc::channel();

        let poller = Poller::start(PollerSetup {
            api,
            store: store.clone(),
            diagnostics: Diagnostics::disabled(),
            interval: Duration::from_secs(60),
            notify: Some(Box::new(move |event: PollEvent| {
                let _ = tx.send(event);
            })),
        });

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, PollEvent::Polled(PollOutcome::Refreshed(1)));
        assert_eq!(store.len(), 1);
        assert_eq!(poller.stats().attempts(), 1);
        poller.stop();
    }

    #[test]
    fn stop_ends_the_schedule() {
        let api = Arc::new(ScriptedApi {
            responses: Mutex::new(Vec::new()),
        });
        let (tx, rx) = mpsc::channel();
        let poller = Poller::start(PollerSetup {
            api,
            store: LogStore::new(),
            diagnostics: Diagnostics::disabled(),
            interval: Duration::from_millis(100),
            notify: Some(Box::new(move |event: PollEvent| {
                let _ = tx.send(event);
            })),
        });
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(poller.is_running());

        poller.stop();
        // Drain whatever arrived before the stop; then the channel must close.
        while rx.recv_timeout(Duration::from_millis(300)).is_ok() {}
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(300)),
            Err(RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn ticks_due_during_a_slow_fetch_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagnostics.jsonl");
        let api = Arc::new(SlowApi::new(Duration::from_millis(250)));

        let poller = Poller::start(PollerSetup {
            api: Arc::clone(&api) as Arc<dyn LogApi>,
            store: LogStore::new(),
            diagnostics: Diagnostics::to_file(&path),
            interval: Duration::from_millis(100),
            notify: None,
        });
        thread::sleep(Duration::from_millis(700));
        let skipped = poller.stats().skipped();
        let attempts = poller.stats().attempts();
        poller.stop();

        assert!(skipped > 0);
        assert!(attempts >= 2);
        assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 1);
        let events = diagnostics::read_events(&path);
        assert!(events.iter().any(|e| e.kind == EventKind::PollSkipped));
    }

    #[test]
    fn result_arriving_after_stop_is_discarded() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let api = Arc::new(GatedApi {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        });
        let store = LogStore::new();
        let (event_tx, event_rx) = mpsc::channel();

        let poller = Poller::start(PollerSetup {
            api,
            store: store.clone(),
            diagnostics: Diagnostics::disabled(),
            interval: Duration::from_millis(100),
            notify: Some(Box::new(move |event: PollEvent| {
                let _ = event_tx.send(event);
            })),
        });
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            let _ = release_tx.send(());
        });
        poller.stop();
        releaser.join().unwrap();

        assert!(store.is_empty());
        assert_eq!(store.generation(), 0);
        assert!(store.last_refresh().is_none());
        assert!(matches!(
            event_rx.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Disconnected)
        ));
    }
}
