//! Report kinds, their fixed column sets, and the flat row type

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const POD_USAGE_COLUMNS: &[&str] = &[
    "report_period_start",
    "report_period_end",
    "pod",
    "namespace",
    "node",
    "resource_id",
    "interval_start",
    "interval_end",
    "pod_usage_cpu_core_seconds",
    "pod_request_cpu_core_seconds",
    "pod_limit_cpu_core_seconds",
    "pod_usage_memory_byte_seconds",
    "pod_request_memory_byte_seconds",
    "pod_limit_memory_byte_seconds",
    "node_capacity_cpu_cores",
    "node_capacity_cpu_core_seconds",
    "node_capacity_memory_bytes",
    "node_capacity_memory_byte_seconds",
    "pod_labels",
];

pub const STORAGE_USAGE_COLUMNS: &[&str] = &[
    "report_period_start",
    "report_period_end",
    "interval_start",
    "interval_end",
    "namespace",
    "pod",
    "persistentvolumeclaim",
    "persistentvolume",
    "storageclass",
    "persistentvolumeclaim_capacity_bytes",
    "persistentvolumeclaim_capacity_byte_seconds",
    "volume_request_storage_byte_seconds",
    "persistentvolumeclaim_usage_byte_seconds",
    "persistentvolume_labels",
    "persistentvolumeclaim_labels",
];

pub const NODE_LABEL_COLUMNS: &[&str] = &[
    "report_period_start",
    "report_period_end",
    "node",
    "interval_start",
    "interval_end",
    "node_labels",
];

pub const NAMESPACE_LABEL_COLUMNS: &[&str] = &[
    "report_period_start",
    "report_period_end",
    "interval_start",
    "interval_end",
    "namespace",
    "namespace_labels",
];

/// The OCP report types the emitter can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    PodUsage,
    StorageUsage,
    NodeLabel,
    NamespaceLabel,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::PodUsage,
        ReportKind::StorageUsage,
        ReportKind::NodeLabel,
        ReportKind::NamespaceLabel,
    ];

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            ReportKind::PodUsage => POD_USAGE_COLUMNS,
            ReportKind::StorageUsage => STORAGE_USAGE_COLUMNS,
            ReportKind::NodeLabel => NODE_LABEL_COLUMNS,
            ReportKind::NamespaceLabel => NAMESPACE_LABEL_COLUMNS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::PodUsage => "pod_usage",
            ReportKind::StorageUsage => "storage_usage",
            ReportKind::NodeLabel => "node_label",
            ReportKind::NamespaceLabel => "namespace_label",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "unknown report kind {s:?} (expected one of: {})",
                    ReportKind::ALL.map(ReportKind::as_str).join(", ")
                )
            })
    }
}

/// One value in a report row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(u64),
    Float(f64),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Text(s) if s.is_empty())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

/// A flat record whose values line up with `kind.columns()`
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    kind: ReportKind,
    values: Vec<Cell>,
}

impl ReportRow {
    /// Start a row with every column empty
    pub fn builder(kind: ReportKind) -> RowBuilder {
        RowBuilder {
            row: ReportRow {
                kind,
                values: vec![Cell::empty(); kind.columns().len()],
            },
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn columns(&self) -> &'static [&'static str] {
        self.kind.columns()
    }

    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        let idx = self.columns().iter().position(|c| *c == column)?;
        self.values.get(idx)
    }

    /// (column, value) pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Cell)> {
        self.columns().iter().copied().zip(self.values.iter())
    }
}

impl Serialize for ReportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Fills a `ReportRow` by column name
pub struct RowBuilder {
    row: ReportRow,
}

impl RowBuilder {
    /// Set a column. Names outside the kind's schema are ignored so a row
    /// can never grow extra columns.
    pub fn set(mut self, column: &str, value: impl Into<Cell>) -> Self {
        if let Some(idx) = self.row.columns().iter().position(|c| *c == column) {
            self.row.values[idx] = value.into();
        }
        self
    }

    pub fn build(self) -> ReportRow {
        self.row
    }
}
