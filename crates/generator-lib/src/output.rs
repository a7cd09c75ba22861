//! Report file writers and the manifest sidecar
//!
//! Rows arrive interleaved by interval, so every requested report kind gets
//! its own open sink and rows are streamed straight to disk.

use crate::naming::{unique_account_id, unique_name, NameTemplate};
use crate::registry::{NamePool, NameRegistry};
use crate::report::{format_timestamp, Cell, ReportKind, ReportRow, ReportWindow};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const MANIFEST_FILE: &str = "manifest.json";

const CLUSTER_ID: NameTemplate<'static> = NameTemplate::words(2).with_prefix("ocp").with_suffix("cluster");

/// Bytes of randomness in an assembly id
const ASSEMBLY_ID_BYTES: usize = 16;

/// On-disk encoding of report files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format {other:?} (expected csv or json)")),
        }
    }
}

/// One finished report file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenReport {
    pub kind: ReportKind,
    pub path: PathBuf,
    pub rows: u64,
}

impl WrittenReport {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Writes `<prefix>_<report_kind>.<ext>` files into a directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    prefix: String,
    format: OutputFormat,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            format,
        }
    }

    pub fn path_for(&self, kind: ReportKind) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.prefix, kind, self.format.extension()))
    }

    /// Stream `rows` into one file per kind. Every kind in `kinds` gets a
    /// file, even when no rows of that kind arrive.
    pub fn write_all<I>(&self, kinds: &[ReportKind], rows: I) -> Result<Vec<WrittenReport>>
    where
        I: IntoIterator<Item = ReportRow>,
    {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory {}", self.dir.display()))?;

        let mut sinks = BTreeMap::new();
        for &kind in kinds {
            if !sinks.contains_key(&kind) {
                sinks.insert(kind, ReportSink::open(self.path_for(kind), kind, self.format)?);
            }
        }

        for row in rows {
            let Some(sink) = sinks.get_mut(&row.kind()) else {
                bail!("Received a {} row but no {} file is open", row.kind(), row.kind());
            };
            sink.write_row(&row)?;
        }

        let mut written = Vec::with_capacity(sinks.len());
        for &kind in kinds {
            if let Some(sink) = sinks.remove(&kind) {
                written.push(sink.finish()?);
            }
        }
        Ok(written)
    }
}

struct ReportSink {
    kind: ReportKind,
    path: PathBuf,
    format: OutputFormat,
    out: BufWriter<File>,
    rows: u64,
}

impl ReportSink {
    fn open(path: PathBuf, kind: ReportKind, format: OutputFormat) -> Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create report file {}", path.display()))?;
        let mut sink = Self {
            kind,
            path,
            format,
            out: BufWriter::new(file),
            rows: 0,
        };
        match format {
            OutputFormat::Csv => {
                let header: Vec<String> = kind.columns().iter().map(|c| csv_field(c)).collect();
                sink.line(&header.join(","))?;
            }
            OutputFormat::Json => {
                sink.out
                    .write_all(b"[")
                    .with_context(|| format!("Failed to write {}", sink.path.display()))?;
            }
        }
        Ok(sink)
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}").with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn write_row(&mut self, row: &ReportRow) -> Result<()> {
        match self.format {
            OutputFormat::Csv => {
                let fields: Vec<String> = row.values().iter().map(csv_cell).collect();
                self.line(&fields.join(","))?;
            }
            OutputFormat::Json => {
                if self.rows > 0 {
                    self.out
                        .write_all(b",")
                        .with_context(|| format!("Failed to write {}", self.path.display()))?;
                }
                serde_json::to_writer(&mut self.out, row)
                    .with_context(|| format!("Failed to encode row for {}", self.path.display()))?;
            }
        }
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<WrittenReport> {
        if self.format == OutputFormat::Json {
            self.line("]")?;
        }
        self.out
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        debug!(report = %self.kind, rows = self.rows, path = %self.path.display(), "Closed report file");
        Ok(WrittenReport {
            kind: self.kind,
            path: self.path,
            rows: self.rows,
        })
    }
}

fn csv_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) => csv_field(text),
        other => other.to_string(),
    }
}

/// Quote per RFC 4180 when the field holds a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Sidecar describing one generated report assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub assembly_id: String,
    pub cluster_id: String,
    pub account_id: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub files: Vec<String>,
}

impl Manifest {
    /// Fresh manifest; the cluster and account ids are drawn from the
    /// registry so they never collide with other generated names.
    pub fn new<R: Rng + ?Sized>(
        rng: &mut R,
        registry: &mut NameRegistry,
        window: &ReportWindow,
        files: Vec<String>,
    ) -> Self {
        let mut id = [0u8; ASSEMBLY_ID_BYTES];
        rng.fill(&mut id[..]);
        Self {
            assembly_id: hex::encode(id),
            cluster_id: unique_name(rng, registry, NamePool::Resources, CLUSTER_ID),
            account_id: unique_account_id(rng, registry),
            date: Utc::now().to_rfc3339(),
            start: format_timestamp(window.start()),
            end: format_timestamp(window.end()),
            files,
        }
    }

    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let body = serde_json::to_string_pretty(self).context("Failed to encode manifest")?;
        fs::write(&path, body)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn label_row(kind: ReportKind, name: &str, labels: &str) -> ReportRow {
        let column = match kind {
            ReportKind::NodeLabel => "node",
            _ => "namespace",
        };
        let label_column = match kind {
            ReportKind::NodeLabel => "node_labels",
            _ => "namespace_labels",
        };
        ReportRow::builder(kind)
            .set("interval_start", "2024-01-01 00:00:00 +0000 UTC")
            .set(column, name)
            .set(label_column, labels)
            .build()
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("label_app:web|label_tier:db"), "label_app:web|label_tier:db");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_csv_writer_splits_rows_by_kind() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path(), "ocp", OutputFormat::Csv);
        let kinds = [ReportKind::NodeLabel, ReportKind::NamespaceLabel, ReportKind::StorageUsage];
        let rows = vec![
            label_row(ReportKind::NodeLabel, "node-a", "label_app:web"),
            label_row(ReportKind::NamespaceLabel, "billing", "label_team:a,b"),
            label_row(ReportKind::NodeLabel, "node-b", "label_app:db"),
        ];

        let written = writer.write_all(&kinds, rows).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(written[0].rows, 2);
        assert_eq!(written[1].rows, 1);
        assert_eq!(written[2].rows, 0);
        assert_eq!(written[0].file_name(), "ocp_node_label.csv");

        let nodes = fs::read_to_string(dir.path().join("ocp_node_label.csv")).unwrap();
        let lines: Vec<&str> = nodes.lines().collect();
        assert_eq!(lines[0], ReportKind::NodeLabel.columns().join(","));
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("node-a"));

        let namespaces = fs::read_to_string(dir.path().join("ocp_namespace_label.csv")).unwrap();
        assert!(namespaces.contains("\"label_team:a,b\""));

        let storage = fs::read_to_string(dir.path().join("ocp_storage_usage.csv")).unwrap();
        assert_eq!(storage.lines().count(), 1, "header only");
    }

    #[test]
    fn test_json_writer_emits_arrays() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("nested"), "run", OutputFormat::Json);
        let rows = vec![
            label_row(ReportKind::NodeLabel, "node-a", "label_app:web"),
            label_row(ReportKind::NodeLabel, "node-b", "label_app:db"),
        ];

        let written = writer
            .write_all(&[ReportKind::NodeLabel, ReportKind::PodUsage], rows)
            .unwrap();
        let body = fs::read_to_string(&written[0].path).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["node"], "node-b");

        let empty = fs::read_to_string(&written[1].path).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&empty).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_writer_rejects_unrequested_kind() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path(), "ocp", OutputFormat::Csv);
        let rows = vec![label_row(ReportKind::NamespaceLabel, "billing", "label_app:web")];
        assert!(writer.write_all(&[ReportKind::NodeLabel], rows).is_err());
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut registry = NameRegistry::new();
        let window = ReportWindow::parse("2024-01-01", "2024-01-02").unwrap();

        let manifest = Manifest::new(
            &mut rng,
            &mut registry,
            &window,
            vec!["ocp_pod_usage.csv".into()],
        );
        assert_eq!(manifest.assembly_id.len(), ASSEMBLY_ID_BYTES * 2);
        assert!(manifest.cluster_id.starts_with("ocp-"));
        assert!(manifest.cluster_id.ends_with("-cluster"));
        assert_eq!(manifest.account_id.len(), 12);
        assert!(registry.contains(NamePool::Resources, &manifest.cluster_id));
        assert!(registry.contains(NamePool::Accounts, &manifest.account_id));
        assert_eq!(manifest.start, "2024-01-01 00:00:00 +0000 UTC");
        assert_eq!(manifest.end, "2024-01-02 00:00:00 +0000 UTC");

        let path = manifest.write(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), MANIFEST_FILE);
        let loaded: Manifest = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, manifest);
    }
}
