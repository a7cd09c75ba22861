//! `costgen generate`: build a topology and write every requested report

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use generator_lib::{
    GeneratorMetrics, Manifest, NameRegistry, OutputFormat, ReportEmitter, ReportKind,
    ReportWindow, ReportWriter, StructuredLogger, TopologyBuilder,
};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use super::{load_config, run_id, seeded_rng};
use crate::output::{print_info, print_success, print_warning};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Generator config file (YAML, JSON or TOML)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// First instant of the report window (overrides the config file)
    #[arg(long)]
    pub start_date: Option<String>,

    /// End of the report window, exclusive (overrides the config file)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for report files and the manifest
    #[arg(long, short, default_value = "costgen-out")]
    pub output: PathBuf,

    /// File name prefix for report files
    #[arg(long, default_value = "ocp")]
    pub prefix: String,

    /// Report file format (csv or json)
    #[arg(long, short, default_value = "csv")]
    pub format: OutputFormat,

    /// Report kinds to write
    #[arg(long, value_delimiter = ',', default_values_t = ReportKind::ALL)]
    pub reports: Vec<ReportKind>,

    /// Write Prometheus text metrics for the run to this file
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let started = Instant::now();
    let metrics = GeneratorMetrics::new();
    let logger = StructuredLogger::new(run_id());

    let config = load_config(args.config.as_deref(), &logger)?;
    let window = ReportWindow::resolve(
        args.start_date.as_deref().or(config.start_date.as_deref()),
        args.end_date.as_deref().or(config.end_date.as_deref()),
        Utc::now().date_naive(),
    )?;

    let mut kinds = args.reports.clone();
    kinds.sort();
    kinds.dedup();

    let mut rng = seeded_rng(args.seed);
    let mut registry = NameRegistry::new();

    let topology = TopologyBuilder::new(&config).build(&mut rng, &mut registry)?;
    let summary = topology.summary();
    metrics.set_topology(&summary);
    logger.log_topology_built(&summary);

    let emitter = ReportEmitter::new(&topology, window);
    logger.log_generation_started(
        &window.start().to_rfc3339(),
        &window.end().to_rfc3339(),
        args.seed,
        emitter.interval_count(),
    );
    if emitter.interval_count() == 0 {
        print_warning("Report window is shorter than one interval; report files will be empty");
    }

    let writer = ReportWriter::new(&args.output, &args.prefix, args.format);
    let written = writer.write_all(&kinds, emitter.rows(&mut rng, &kinds))?;
    for report in &written {
        metrics.add_rows(report.kind, report.rows);
        logger.log_report_written(report.kind, &report.path, report.rows);
        print_success(&format!(
            "Wrote {} {} rows to {}",
            report.rows,
            report.kind,
            report.path.display()
        ));
    }

    let files = written.iter().map(|report| report.file_name()).collect();
    let manifest = Manifest::new(&mut rng, &mut registry, &window, files);
    let manifest_path = manifest.write(&args.output)?;
    logger.log_manifest_written(&manifest_path, manifest.files.len());
    print_info(&format!(
        "Manifest {} (cluster {}, account {})",
        manifest_path.display(),
        manifest.cluster_id,
        manifest.account_id
    ));

    let elapsed = started.elapsed().as_secs_f64();
    metrics.observe_generation(elapsed);
    info!(
        elapsed_secs = elapsed,
        nodes = summary.nodes,
        pods = summary.pods,
        "Generation finished"
    );

    if let Some(path) = &args.metrics_file {
        fs::write(path, metrics.gather_text()?)
            .with_context(|| format!("Failed to write metrics file {}", path.display()))?;
    }

    Ok(())
}
