// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Progress Reporter
//!
//! A process-wide background daemon that periodically publishes aggregated
//! progress of concurrently running long tasks without blocking them.
//!
//! Callers register a [`Tracker`] per named task and report against it from
//! any thread with [`Tracker::one_done`] / [`Tracker::done`]; the reporter's
//! background thread snapshots the registered trackers on a fixed tick and
//! logs one line per tracker. A tracker that has been [`Tracker::close`]d
//! gets one final line on the next tick, then is forgotten — see
//! [`ProgressReporter`] for the exact format.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Sentinel `total` meaning "unknown item count".
const UNKNOWN_TOTAL: i64 = -1;

struct TrackerInner {
    name: String,
    total: i64,
    completed: AtomicU64,
    finished: AtomicBool,
}

/// Handle to a single named task's progress counters.
///
/// Cheaply cloneable (it's an `Arc` underneath); counters are atomic, so a
/// tracker can be reported against from arbitrary threads without external
/// locking.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    /// Increments `completed` by one.
    pub fn one_done(&self) {
        self.inner.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Adds `n` to `completed`.
    pub fn done(&self, n: u64) {
        self.inner.completed.fetch_add(n, Ordering::SeqCst);
    }

    /// Marks the task as finished. Idempotent — closing twice never double
    /// logs, since the reporter removes a tracker from its live set right
    /// after emitting its terminal line.
    pub fn close(&self) {
        self.inner.finished.store(true, Ordering::SeqCst);
    }

    /// Current completed count, mostly useful for tests.
    pub fn completed(&self) -> u64 {
        self.inner.completed.load(Ordering::SeqCst)
    }
}

fn format_line(tracker: &TrackerInner) -> String {
    let completed = tracker.completed.load(Ordering::SeqCst);
    let finished = tracker.finished.load(Ordering::SeqCst);

    let mut line = if tracker.total >= 0 {
        let total = tracker.total as u64;
        let pct = if total == 0 {
            100
        } else {
            (completed.saturating_mul(100)) / total
        };
        format!("{} finished {} of {} ({}%) items", tracker.name, completed, total, pct)
    } else {
        format!("{} finished {} items", tracker.name, completed)
    };

    if finished {
        line.push_str(" and is done");
    }
    line
}

/// Process-wide progress reporter.
///
/// Register tasks with [`ProgressReporter::track`] and let the background
/// thread publish a line per task on each tick. The reporter never
/// propagates a panic from a single tracker's formatting into the others in
/// the same tick, and its background thread is never joined, so it cannot
/// block process exit.
pub struct ProgressReporter {
    trackers: Arc<Mutex<Vec<Arc<TrackerInner>>>>,
    stop: Arc<AtomicBool>,
}

static GLOBAL: OnceLock<ProgressReporter> = OnceLock::new();

impl ProgressReporter {
    /// Creates a reporter with the given tick interval and starts its
    /// background thread immediately.
    pub fn new(tick_interval: Duration) -> Self {
        let reporter = Self {
            trackers: Arc::new(Mutex::new(Vec::new())),
            stop: Arc::new(AtomicBool::new(false)),
        };
        reporter.spawn_daemon(tick_interval);
        reporter
    }

    fn spawn_daemon(&self, tick_interval: Duration) {
        let trackers = Arc::clone(&self.trackers);
        let stop = Arc::clone(&self.stop);
        // Intentionally not joined anywhere: an un-joined thread does not
        // keep the process alive, which is what makes this a daemon.
        let _ = std::thread::Builder::new().name("progress-reporter".to_string()).spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                std::thread::sleep(tick_interval);
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                for line in tick(&trackers) {
                    tracing::info!(target: "progress", "{line}");
                }
            }
        });
    }

    /// Returns the process-wide singleton, creating it on first access with
    /// the default ~30s tick interval.
    pub fn global() -> &'static ProgressReporter {
        GLOBAL.get_or_init(|| ProgressReporter::new(DEFAULT_TICK_INTERVAL))
    }

    /// Registers a new tracked task and returns its handle.
    ///
    /// `total` is the estimated item count, or `None` for "unknown" (the
    /// reporter formats unknown-total tasks without a percentage).
    pub fn track(&self, name: impl Into<String>, total: Option<u64>) -> Tracker {
        let inner = Arc::new(TrackerInner {
            name: name.into(),
            total: total.map(|t| t as i64).unwrap_or(UNKNOWN_TOTAL),
            completed: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        });
        self.trackers.lock().push(Arc::clone(&inner));
        Tracker { inner }
    }

    /// Runs one tick synchronously and returns the lines it produced, in
    /// registration order. Intended for tests that don't want to wait on
    /// the real tick interval; the background daemon calls the same
    /// underlying logic on its own schedule.
    pub fn tick_now(&self) -> Vec<String> {
        let mut trackers = self.trackers.lock();
        let mut lines = Vec::with_capacity(trackers.len());
        trackers.retain(|tracker| {
            let line = catch_unwind(AssertUnwindSafe(|| format_line(tracker))).ok();
            let finished = tracker.finished.load(Ordering::SeqCst);
            if let Some(line) = line {
                lines.push(line);
            }
            !finished
        });
        lines
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Standalone tick implementation shared by the background daemon loop.
/// Swallows a panicking tracker's formatting so the rest of the tick still
/// gets its lines.
fn tick(trackers: &Mutex<Vec<Arc<TrackerInner>>>) -> Vec<String> {
    let mut guard = trackers.lock();
    let mut lines = Vec::with_capacity(guard.len());
    guard.retain(|tracker| {
        let finished = tracker.finished.load(Ordering::SeqCst);
        if let Ok(line) = catch_unwind(AssertUnwindSafe(|| format_line(tracker))) {
            lines.push(line);
        }
        !finished
    });
    lines
}
