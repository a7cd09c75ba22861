//! Observability infrastructure for generation runs
//!
//! Provides:
//! - Prometheus metrics (rows emitted per report, topology size, run duration)
//! - Structured logging of run milestones with tracing

use crate::error::ConfigError;
use crate::models::TopologySummary;
use crate::report::ReportKind;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge_vec, Encoder, Histogram,
    IntCounterVec, IntGaugeVec, TextEncoder,
};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for whole-run durations (in seconds)
const RUN_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<GeneratorMetricsInner> = OnceLock::new();

struct GeneratorMetricsInner {
    rows_emitted: IntCounterVec,
    topology_entities: IntGaugeVec,
    generation_seconds: Histogram,
}

impl GeneratorMetricsInner {
    fn new() -> Self {
        Self {
            rows_emitted: register_int_counter_vec!(
                "costgen_rows_emitted_total",
                "Report rows written, by report kind",
                &["report"]
            )
            .expect("Failed to register rows_emitted_total"),

            topology_entities: register_int_gauge_vec!(
                "costgen_topology_entities",
                "Entities in the most recently built topology",
                &["entity"]
            )
            .expect("Failed to register topology_entities"),

            generation_seconds: register_histogram!(
                "costgen_generation_seconds",
                "Wall time of a full generation run",
                RUN_BUCKETS.to_vec()
            )
            .expect("Failed to register generation_seconds"),
        }
    }
}

/// Handle to the process-wide generator metrics. Clones share the same
/// underlying collectors.
#[derive(Clone)]
pub struct GeneratorMetrics {
    _private: (),
}

impl Default for GeneratorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(GeneratorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &GeneratorMetricsInner {
        GLOBAL_METRICS.get_or_init(GeneratorMetricsInner::new)
    }

    pub fn add_rows(&self, kind: ReportKind, rows: u64) {
        self.inner()
            .rows_emitted
            .with_label_values(&[kind.as_str()])
            .inc_by(rows);
    }

    pub fn rows_emitted(&self, kind: ReportKind) -> u64 {
        self.inner()
            .rows_emitted
            .with_label_values(&[kind.as_str()])
            .get()
    }

    /// Record the size of a freshly built topology
    pub fn set_topology(&self, summary: &TopologySummary) {
        let gauge = &self.inner().topology_entities;
        for (entity, count) in [
            ("nodes", summary.nodes),
            ("namespaces", summary.namespaces),
            ("pods", summary.pods),
            ("volumes", summary.volumes),
            ("volume_claims", summary.volume_claims),
        ] {
            gauge.with_label_values(&[entity]).set(count as i64);
        }
    }

    pub fn topology_entities(&self, entity: &str) -> i64 {
        self.inner()
            .topology_entities
            .with_label_values(&[entity])
            .get()
    }

    pub fn observe_generation(&self, duration_secs: f64) {
        self.inner().generation_seconds.observe(duration_secs);
    }

    /// Prometheus text exposition of every registered metric
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Structured logger for generation runs
///
/// Every event carries the run id so logs from concurrent CI jobs can be
/// told apart.
#[derive(Clone)]
pub struct StructuredLogger {
    run_id: String,
}

impl StructuredLogger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log_generation_started(&self, start: &str, end: &str, seed: Option<u64>, intervals: usize) {
        info!(
            event = "generation_started",
            run_id = %self.run_id,
            window_start = %start,
            window_end = %end,
            seed = ?seed,
            intervals = intervals,
            "Generation run started"
        );
    }

    pub fn log_topology_built(&self, summary: &TopologySummary) {
        info!(
            event = "topology_built",
            run_id = %self.run_id,
            nodes = summary.nodes,
            namespaces = summary.namespaces,
            pods = summary.pods,
            volumes = summary.volumes,
            volume_claims = summary.volume_claims,
            "Topology ready"
        );
    }

    pub fn log_report_written(&self, kind: ReportKind, path: &Path, rows: u64) {
        info!(
            event = "report_written",
            run_id = %self.run_id,
            report = %kind,
            path = %path.display(),
            rows = rows,
            "Report file written"
        );
    }

    pub fn log_manifest_written(&self, path: &Path, files: usize) {
        info!(
            event = "manifest_written",
            run_id = %self.run_id,
            path = %path.display(),
            files = files,
            "Manifest written"
        );
    }

    pub fn log_config_rejected(&self, error: &ConfigError) {
        warn!(
            event = "config_rejected",
            run_id = %self.run_id,
            problems = error.violations.len(),
            fields = ?error.fields(),
            "Generator configuration rejected"
        );
    }
}
