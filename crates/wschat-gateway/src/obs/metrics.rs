//! Label-keyed metric families for the gateway.
//!
//! Labels are flattened into sorted `(key, value)` vectors so rendering order
//! is deterministic per series. Histogram buckets are fixed and expressed in
//! microseconds to keep the hot path integer-only.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// `name` or `name{k="v",...}`.
fn series(name: &str, key: &LabelKey) -> String {
    if key.is_empty() {
        return name.to_string();
    }
    let labels = key
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("{name}{{{labels}}}")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for one label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let _ = writeln!(
                out,
                "{} {}",
                series(name, r.key()),
                r.value().load(Ordering::Relaxed)
            );
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn dec(&self, labels: &[(&str, &str)]) {
        self.add(labels, -1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} gauge");
        for r in self.map.iter() {
            let _ = writeln!(
                out,
                "{} {}",
                series(name, r.key()),
                r.value().load(Ordering::Relaxed)
            );
        }
    }
}

// 50us, 100us, 500us, 1ms, 5ms, 10ms, 50ms
const BUCKETS_MICROS: [u64; 7] = [50, 100, 500, 1_000, 5_000, 10_000, 50_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MICROS.len()],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Record one observation into the cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], elapsed: Duration) {
        let hist = self.map.entry(label_key(labels)).or_default();
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);
        for (bucket, le) in hist.buckets.iter().zip(BUCKETS_MICROS) {
            if micros <= le {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        for r in self.map.iter() {
            let hist = r.value();
            let count = hist.count.load(Ordering::Relaxed);

            for (bucket, le) in hist.buckets.iter().zip(BUCKETS_MICROS) {
                let mut key = r.key().clone();
                key.push(("le".into(), le.to_string()));
                let _ = writeln!(
                    out,
                    "{} {}",
                    series(&format!("{name}_bucket"), &key),
                    bucket.load(Ordering::Relaxed)
                );
            }
            let mut inf = r.key().clone();
            inf.push(("le".into(), "+Inf".into()));
            let _ = writeln!(out, "{} {count}", series(&format!("{name}_bucket"), &inf));
            let _ = writeln!(
                out,
                "{} {}",
                series(&format!("{name}_sum"), r.key()),
                hist.sum.load(Ordering::Relaxed)
            );
            let _ = writeln!(out, "{} {count}", series(&format!("{name}_count"), r.key()));
        }
    }
}

#[derive(Default)]
pub struct GatewayMetrics {
    pub connections_total: CounterVec,
    pub connections_active: GaugeVec,
    pub handshake_failures: CounterVec,
    pub frames_in: CounterVec,
    pub decode_errors: CounterVec,
    pub parse_errors: CounterVec,
    pub messages: CounterVec,
    pub dropped_messages: CounterVec,
    pub evictions: CounterVec,
    pub dispatch_duration: HistogramVec,
}

impl GatewayMetrics {
    /// Render all families plus scrape-time gauges supplied by the caller.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.connections_total.render("wschat_connections_total", &mut out);
        self.connections_active.render("wschat_connections_active", &mut out);
        self.handshake_failures.render("wschat_handshake_failures_total", &mut out);
        self.frames_in.render("wschat_frames_in_total", &mut out);
        self.decode_errors.render("wschat_decode_errors_total", &mut out);
        self.parse_errors.render("wschat_parse_errors_total", &mut out);
        self.messages.render("wschat_messages_total", &mut out);
        self.dropped_messages.render("wschat_dropped_messages_total", &mut out);
        self.evictions.render("wschat_evictions_total", &mut out);
        self.dispatch_duration.render("wschat_dispatch_duration_micros", &mut out);

        for (name, v) in extra {
            let _ = writeln!(out, "# TYPE {name} gauge\n{name} {v}");
        }
        out
    }
}
