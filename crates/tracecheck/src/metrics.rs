//! Run metrics using metrics-rs.
//!
//! Recording is free when no recorder is installed; `--metrics` installs the
//! in-process [`CliRecorder`] and prints its contents once the run is over.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit, counter,
    describe_counter, describe_gauge, gauge,
};
use parking_lot::RwLock;

use crate::report::DiagnosticKind;

/// Register metric descriptions. Call once at startup.
pub fn init() {
    describe_counter!(
        "tracecheck_reference_records_total",
        Unit::Count,
        "Instructions parsed from the reference log"
    );
    describe_counter!(
        "tracecheck_candidate_records_total",
        Unit::Count,
        "Instructions parsed from the candidate trace"
    );
    describe_counter!(
        "tracecheck_instructions_checked_total",
        Unit::Count,
        "Matched instruction pairs checked"
    );
    describe_counter!(
        "tracecheck_diagnostics_total",
        Unit::Count,
        "Diagnostics raised, by kind"
    );
    describe_gauge!(
        "tracecheck_parse_seconds",
        Unit::Seconds,
        "Wall-clock time spent parsing an input"
    );
    describe_gauge!(
        "tracecheck_check_seconds",
        Unit::Seconds,
        "Wall-clock time spent aligning and checking"
    );
}

/// Record a parsed input (`input` is "reference" or "candidate").
pub fn record_parse(input: &'static str, records: usize, secs: f64) {
    let name = match input {
        "reference" => "tracecheck_reference_records_total",
        _ => "tracecheck_candidate_records_total",
    };
    counter!(name).absolute(records as u64);
    gauge!("tracecheck_parse_seconds", "input" => input).set(secs);
}

pub fn record_diagnostic(kind: DiagnosticKind) {
    counter!("tracecheck_diagnostics_total", "kind" => kind.label()).increment(1);
}

pub fn record_checked(checked: usize) {
    counter!("tracecheck_instructions_checked_total").absolute(checked as u64);
}

pub fn record_check_time(secs: f64) {
    gauge!("tracecheck_check_seconds").set(secs);
}

// ============================================================================
// CLI Recorder for terminal output
// ============================================================================

#[derive(Default)]
struct Store {
    counters: RwLock<HashMap<String, u64>>,
    gauges: RwLock<HashMap<String, f64>>,
}

struct CliCounter {
    key: String,
    store: Arc<Store>,
}

impl metrics::CounterFn for CliCounter {
    fn increment(&self, value: u64) {
        *self.store.counters.write().entry(self.key.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        self.store.counters.write().insert(self.key.clone(), value);
    }
}

struct CliGauge {
    key: String,
    store: Arc<Store>,
}

impl metrics::GaugeFn for CliGauge {
    fn increment(&self, value: f64) {
        *self.store.gauges.write().entry(self.key.clone()).or_insert(0.0) += value;
    }

    fn decrement(&self, value: f64) {
        *self.store.gauges.write().entry(self.key.clone()).or_insert(0.0) -= value;
    }

    fn set(&self, value: f64) {
        self.store.gauges.write().insert(self.key.clone(), value);
    }
}

/// Recorder that keeps counters and gauges in memory for a terminal summary.
#[derive(Default)]
pub struct CliRecorder {
    store: Arc<Store>,
}

impl CliRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the global recorder. Returns `None` if one is already installed.
    pub fn install(self) -> Option<CliRecorderHandle> {
        let store = Arc::clone(&self.store);
        metrics::set_global_recorder(self).ok()?;
        Some(CliRecorderHandle { store })
    }
}

fn key_to_string(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|l| format!("{}={}", l.key(), l.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CliRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(CliCounter {
            key: key_to_string(key),
            store: Arc::clone(&self.store),
        }))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(Arc::new(CliGauge {
            key: key_to_string(key),
            store: Arc::clone(&self.store),
        }))
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

/// Read access to what the installed [`CliRecorder`] collected.
pub struct CliRecorderHandle {
    store: Arc<Store>,
}

impl CliRecorderHandle {
    pub fn get_counter(&self, key: &str) -> Option<u64> {
        self.store.counters.read().get(key).copied()
    }

    pub fn get_gauge(&self, key: &str) -> Option<f64> {
        self.store.gauges.read().get(key).copied()
    }

    /// Print all collected metrics, sorted by key.
    pub fn print_summary(&self) {
        let counters = self.store.counters.read();
        let gauges = self.store.gauges.read();
        if counters.is_empty() && gauges.is_empty() {
            println!("No metrics collected.");
            return;
        }

        println!();
        println!("## Metrics Summary");
        println!();

        if !counters.is_empty() {
            println!("### Counters");
            let mut entries: Vec<_> = counters.iter().collect();
            entries.sort();
            for (key, value) in entries {
                println!("  {key}: {value}");
            }
            println!();
        }

        if !gauges.is_empty() {
            println!("### Gauges");
            let mut entries: Vec<_> = gauges.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in entries {
                println!("  {key}: {value:.6}");
            }
            println!();
        }
    }
}
