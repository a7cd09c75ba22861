//! `costgen validate`: check a config without generating anything

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Args;
use generator_lib::{ConfigError, ReportWindow, StructuredLogger};
use std::path::PathBuf;

use super::{load_config, run_id};
use crate::output::{print_error, print_info, print_success};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Generator config file (YAML, JSON or TOML)
    #[arg(long, short)]
    pub config: PathBuf,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let logger = StructuredLogger::new(run_id());

    let config = match load_config(Some(args.config.as_path()), &logger) {
        Ok(config) => config,
        Err(err) => {
            if let Some(config_err) = err.downcast_ref::<ConfigError>() {
                for violation in &config_err.violations {
                    print_error(&violation.to_string());
                }
                bail!(
                    "{} has {} problem(s)",
                    args.config.display(),
                    config_err.violations.len()
                );
            }
            return Err(err);
        }
    };

    let window = ReportWindow::resolve(
        config.start_date.as_deref(),
        config.end_date.as_deref(),
        Utc::now().date_naive(),
    )?;

    print_success(&format!("{} is valid", args.config.display()));
    match &config.nodes {
        Some(nodes) => print_info(&format!("{} pinned node(s)", nodes.len())),
        None => print_info(&format!("Up to {} random node(s)", config.max_nodes)),
    }
    print_info(&format!("Report window {} to {}", window.start(), window.end()));

    Ok(())
}
