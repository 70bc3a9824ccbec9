//! In-process metrics aggregation, safe for concurrent use by all virtual
//! users, printed as a report at the end of the run.
//!
//! Timer samples are keyed by action name and aggregated in a [`DDSketch`].
//! Counters follow the `{action}_{status}`, `{action}_no_requests` and global
//! `no_requests` key scheme.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sketches_ddsketch::DDSketch;
use yansi::Paint;

/// The metrics sink shared by all virtual users.
#[derive(Default)]
pub struct Metrics {
    timings: Mutex<HashMap<&'static str, DDSketch>>,
    counters: Mutex<BTreeMap<String, u64>>,
}

impl Metrics {
    /// Starts a timer for the given action. The sample is recorded when the
    /// returned guard drops, also on early returns.
    pub fn timer(&self, action: &'static str) -> Timer<'_> {
        Timer {
            metrics: self,
            action,
            start: Instant::now(),
        }
    }

    /// Records one timer sample for the given action.
    pub fn record_timing(&self, action: &'static str, elapsed: Duration) {
        self.timings
            .lock()
            .unwrap()
            .entry(action)
            .or_default()
            .add(elapsed.as_secs_f64());
    }

    /// Increments the counter with the given key by one.
    pub fn incr(&self, key: &str) {
        let mut counters = self.counters.lock().unwrap();
        *counters.entry(key.to_owned()).or_default() += 1;
    }

    /// Current value of a counter, zero if it was never incremented.
    pub fn counter(&self, key: &str) -> u64 {
        self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Number of timer samples recorded for the given action.
    pub fn timing_count(&self, action: &str) -> u64 {
        self.timings
            .lock()
            .unwrap()
            .get(action)
            .map(|sketch| sketch.count() as u64)
            .unwrap_or(0)
    }

    /// Prints the per-action timings and all counters.
    pub fn print_report(&self, duration: Duration) {
        let timings = self.timings.lock().unwrap();
        let mut actions: Vec<_> = timings.iter().collect();
        actions.sort_by_key(|(name, _)| *name);

        for (name, sketch) in actions {
            if sketch.count() == 0 {
                continue;
            }
            println!();
            println!(
                "{} {} ({} requests)",
                "##".bold(),
                name.bold().blue(),
                sketch.count().bold()
            );
            let ops_ps = sketch.count() as f64 / duration.as_secs_f64();
            println!("  {:.2} requests/s", ops_ps.bold());
            print_percentiles(sketch, Duration::from_secs_f64);
        }

        let counters = self.counters.lock().unwrap();
        if !counters.is_empty() {
            println!();
            println!("{}", "## COUNTERS".bold());
            for (key, value) in counters.iter() {
                println!("  {key}: {}", value.bold());
            }
        }
    }
}

/// Guard recording one timer sample on drop.
pub struct Timer<'a> {
    metrics: &'a Metrics,
    action: &'static str,
    start: Instant,
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.metrics.record_timing(self.action, self.start.elapsed());
    }
}

fn print_percentiles<T: fmt::Debug>(sketch: &DDSketch, map: impl Fn(f64) -> T) {
    let ops = sketch.count();
    let avg = map(sketch.sum().unwrap() / ops as f64);
    let p50 = map(sketch.quantile(0.5).unwrap().unwrap());
    let p90 = map(sketch.quantile(0.9).unwrap().unwrap());
    let p99 = map(sketch.quantile(0.99).unwrap().unwrap());
    println!(
        "  avg: {:.2?}; p50: {p50:.2?}; p90: {p90:.2?}; p99: {p99:.2?}",
        avg.bold()
    );
}
