//! Flattening of a topology into per-interval report rows
//!
//! Rows are produced lazily: the outer loop walks intervals, the inner loop
//! walks report kinds and then entities in tree order. Only one interval's
//! rows are buffered at a time.

use super::schema::{ReportKind, ReportRow};
use super::window::{format_timestamp, hourly, Interval, Intervals, ReportWindow};
use crate::models::{Namespace, Node, Pod, Topology, Volume, VolumeClaim};
use crate::topology::{sample_up_to, CPU_FLOOR, MEM_FLOOR_GIG, STORAGE_FLOOR_GIG};
use crate::units::{gig_to_bytes, CPU_DECIMALS, GIB_BYTES, GIG_DECIMALS};
use chrono::Duration;
use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;

/// Turns a built topology into report rows over a window
#[derive(Debug, Clone)]
pub struct ReportEmitter<'a> {
    topology: &'a Topology,
    window: ReportWindow,
    interval_width: Duration,
}

impl<'a> ReportEmitter<'a> {
    /// Emitter with the hourly OCP interval width
    pub fn new(topology: &'a Topology, window: ReportWindow) -> Self {
        Self {
            topology,
            window,
            interval_width: hourly(),
        }
    }

    pub fn with_interval_width(mut self, width: Duration) -> Self {
        self.interval_width = width;
        self
    }

    pub fn window(&self) -> &ReportWindow {
        &self.window
    }

    /// Number of intervals the row stream will cover
    pub fn interval_count(&self) -> usize {
        self.window.interval_count(self.interval_width)
    }

    /// Start a single-pass row stream for the given report kinds
    pub fn rows<'r, R: Rng + ?Sized>(
        &self,
        rng: &'r mut R,
        kinds: &[ReportKind],
    ) -> UsageRows<'a, 'r, R> {
        UsageRows {
            topology: self.topology,
            kinds: kinds.to_vec(),
            intervals: self.window.intervals(self.interval_width),
            pending: VecDeque::new(),
            rng,
        }
    }
}

/// Lazy, finite row stream; restart by calling `ReportEmitter::rows` again
pub struct UsageRows<'a, 'r, R: Rng + ?Sized> {
    topology: &'a Topology,
    kinds: Vec<ReportKind>,
    intervals: Intervals,
    pending: VecDeque<ReportRow>,
    rng: &'r mut R,
}

impl<R: Rng + ?Sized> Iterator for UsageRows<'_, '_, R> {
    type Item = ReportRow;

    fn next(&mut self) -> Option<ReportRow> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(row);
            }
            let interval = self.intervals.next()?;
            self.fill(&interval);
            debug!(
                interval_start = %interval.start,
                rows = self.pending.len(),
                "Flattened interval"
            );
        }
    }
}

impl<R: Rng + ?Sized> UsageRows<'_, '_, R> {
    fn fill(&mut self, interval: &Interval) {
        let stamps = Stamps::new(interval);
        let topology = self.topology;
        for kind in self.kinds.clone() {
            match kind {
                ReportKind::PodUsage => {
                    for (node, ns, pod) in topology.pods() {
                        let row = pod_usage_row(&mut *self.rng, &stamps, interval, node, ns, pod);
                        self.pending.push_back(row);
                    }
                }
                ReportKind::StorageUsage => {
                    for (ns, volume, claim) in topology.volume_claims() {
                        let row = storage_usage_row(&mut *self.rng, &stamps, interval, ns, volume, claim);
                        self.pending.push_back(row);
                    }
                }
                ReportKind::NodeLabel => {
                    for node in &topology.nodes {
                        self.pending.push_back(node_label_row(&stamps, node));
                    }
                }
                ReportKind::NamespaceLabel => {
                    for (_, ns) in topology.namespaces() {
                        self.pending.push_back(namespace_label_row(&stamps, ns));
                    }
                }
            }
        }
    }
}

/// Pre-formatted boundary timestamps shared by every row of one interval
struct Stamps {
    period_start: String,
    period_end: String,
    interval_start: String,
    interval_end: String,
}

impl Stamps {
    fn new(interval: &Interval) -> Self {
        Self {
            period_start: format_timestamp(interval.report_period_start()),
            period_end: format_timestamp(interval.report_period_end()),
            interval_start: format_timestamp(interval.start),
            interval_end: format_timestamp(interval.end),
        }
    }
}

/// Seconds of activity credited to a pod in one interval. `pod_seconds`
/// is clamped to the interval width.
pub fn active_seconds(pod: &Pod, interval: &Interval) -> u32 {
    pod.pod_seconds.min(interval.seconds())
}

fn pod_usage_row<R: Rng + ?Sized>(
    rng: &mut R,
    stamps: &Stamps,
    interval: &Interval,
    node: &Node,
    ns: &Namespace,
    pod: &Pod,
) -> ReportRow {
    let date = interval.date();
    let active = u64::from(active_seconds(pod, interval));
    let secs = active as f64;
    let interval_secs = u64::from(interval.seconds());

    let cpu_usage = match pod.cpu_usage.get(&date) {
        Some(v) => *v,
        None => sample_up_to(rng, CPU_FLOOR, pod.cpu_limit, CPU_DECIMALS),
    };
    let mem_usage_gig = match pod.mem_usage_gig.get(&date) {
        Some(v) => *v,
        None => sample_up_to(rng, MEM_FLOOR_GIG, pod.mem_limit_gig, GIG_DECIMALS),
    };

    ReportRow::builder(ReportKind::PodUsage)
        .set("report_period_start", stamps.period_start.as_str())
        .set("report_period_end", stamps.period_end.as_str())
        .set("pod", pod.name.as_str())
        .set("namespace", ns.name.as_str())
        .set("node", node.name.as_str())
        .set("resource_id", node.resource_id.as_str())
        .set("interval_start", stamps.interval_start.as_str())
        .set("interval_end", stamps.interval_end.as_str())
        .set("pod_usage_cpu_core_seconds", cpu_usage * secs)
        .set("pod_request_cpu_core_seconds", pod.cpu_request * secs)
        .set("pod_limit_cpu_core_seconds", pod.cpu_limit * secs)
        .set("pod_usage_memory_byte_seconds", gig_to_bytes(mem_usage_gig).saturating_mul(active))
        .set("pod_request_memory_byte_seconds", gig_to_bytes(pod.mem_request_gig).saturating_mul(active))
        .set("pod_limit_memory_byte_seconds", gig_to_bytes(pod.mem_limit_gig).saturating_mul(active))
        .set("node_capacity_cpu_cores", u64::from(node.cpu_cores))
        .set("node_capacity_cpu_core_seconds", u64::from(node.cpu_cores).saturating_mul(interval_secs))
        .set("node_capacity_memory_bytes", node.memory_bytes)
        .set("node_capacity_memory_byte_seconds", node.memory_bytes.saturating_mul(interval_secs))
        .set("pod_labels", pod.labels.as_str())
        .build()
}

fn storage_usage_row<R: Rng + ?Sized>(
    rng: &mut R,
    stamps: &Stamps,
    interval: &Interval,
    ns: &Namespace,
    volume: &Volume,
    claim: &VolumeClaim,
) -> ReportRow {
    let secs = u64::from(interval.seconds());
    let capacity_bytes = claim.capacity_gig.saturating_mul(GIB_BYTES);
    let usage_gig = match claim.usage_gig.get(&interval.date()) {
        Some(v) => *v,
        None => sample_up_to(rng, STORAGE_FLOOR_GIG, claim.capacity_gig as f64, GIG_DECIMALS),
    };

    ReportRow::builder(ReportKind::StorageUsage)
        .set("report_period_start", stamps.period_start.as_str())
        .set("report_period_end", stamps.period_end.as_str())
        .set("interval_start", stamps.interval_start.as_str())
        .set("interval_end", stamps.interval_end.as_str())
        .set("namespace", ns.name.as_str())
        .set("pod", claim.pod_name.as_str())
        .set("persistentvolumeclaim", claim.name.as_str())
        .set("persistentvolume", volume.name.as_str())
        .set("storageclass", volume.storage_class.as_str())
        .set("persistentvolumeclaim_capacity_bytes", capacity_bytes)
        .set("persistentvolumeclaim_capacity_byte_seconds", capacity_bytes.saturating_mul(secs))
        .set(
            "volume_request_storage_byte_seconds",
            volume
                .volume_request_gig
                .saturating_mul(GIB_BYTES)
                .saturating_mul(secs),
        )
        .set(
            "persistentvolumeclaim_usage_byte_seconds",
            gig_to_bytes(usage_gig).saturating_mul(secs),
        )
        .set("persistentvolume_labels", volume.labels.as_str())
        .set("persistentvolumeclaim_labels", claim.labels.as_str())
        .build()
}

fn node_label_row(stamps: &Stamps, node: &Node) -> ReportRow {
    ReportRow::builder(ReportKind::NodeLabel)
        .set("report_period_start", stamps.period_start.as_str())
        .set("report_period_end", stamps.period_end.as_str())
        .set("node", node.name.as_str())
        .set("interval_start", stamps.interval_start.as_str())
        .set("interval_end", stamps.interval_end.as_str())
        .set("node_labels", node.labels.as_str())
        .build()
}

fn namespace_label_row(stamps: &Stamps, ns: &Namespace) -> ReportRow {
    ReportRow::builder(ReportKind::NamespaceLabel)
        .set("report_period_start", stamps.period_start.as_str())
        .set("report_period_end", stamps.period_end.as_str())
        .set("interval_start", stamps.interval_start.as_str())
        .set("interval_end", stamps.interval_end.as_str())
        .set("namespace", ns.name.as_str())
        .set("namespace_labels", ns.labels.as_str())
        .build()
}
