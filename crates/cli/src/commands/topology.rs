//! `costgen topology`: print a generated topology

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use generator_lib::units::GIB_BYTES;
use generator_lib::{NameRegistry, StructuredLogger, Topology, TopologyBuilder};
use std::path::PathBuf;
use tabled::Tabled;

use super::{load_config, run_id, seeded_rng};
use crate::output::{format_bytes, print_json, print_table, OutputFormat};

#[derive(Args, Debug)]
pub struct TopologyArgs {
    /// Generator config file (YAML, JSON or TOML)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// One table row per (node, namespace)
#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "CPU")]
    cpu_cores: u32,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pods")]
    pods: usize,
    #[tabled(rename = "Volumes")]
    volumes: usize,
    #[tabled(rename = "Claims")]
    claims: usize,
    #[tabled(rename = "Claimed")]
    claimed: String,
}

fn namespace_rows(topology: &Topology) -> Vec<NamespaceRow> {
    topology
        .namespaces()
        .map(|(node, ns)| NamespaceRow {
            node: node.name.clone(),
            cpu_cores: node.cpu_cores,
            memory: format_bytes(node.memory_bytes),
            namespace: ns.name.clone(),
            pods: ns.pods.len(),
            volumes: ns.volumes.len(),
            claims: ns.volumes.iter().map(|v| v.volume_claims.len()).sum(),
            claimed: format_bytes(
                ns.volumes
                    .iter()
                    .map(|v| v.claimed_gig().saturating_mul(GIB_BYTES))
                    .sum(),
            ),
        })
        .collect()
}

pub fn run(args: TopologyArgs) -> Result<()> {
    let logger = StructuredLogger::new(run_id());
    let config = load_config(args.config.as_deref(), &logger)?;

    let mut rng = seeded_rng(args.seed);
    let topology = TopologyBuilder::new(&config).build(&mut rng, &mut NameRegistry::new())?;
    logger.log_topology_built(&topology.summary());

    match args.format {
        OutputFormat::Json => print_json(&topology)?,
        OutputFormat::Table => {
            let summary = topology.summary();
            println!("{}", "Generated Topology".bold());
            println!("{}", "=".repeat(50));
            println!(
                "Nodes: {}  Namespaces: {}  Pods: {}  Volumes: {}  Claims: {}",
                summary.nodes.to_string().cyan(),
                summary.namespaces.to_string().cyan(),
                summary.pods.to_string().cyan(),
                summary.volumes.to_string().cyan(),
                summary.volume_claims.to_string().cyan()
            );
            println!();
            print_table(&namespace_rows(&topology));
        }
    }

    Ok(())
}
