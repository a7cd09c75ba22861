//! Subcommand implementations

pub mod generate;
pub mod topology;
pub mod validate;

use crate::config;
use anyhow::Result;
use generator_lib::{ConfigError, GeneratorConfig, StructuredLogger};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

/// Seeded generator for reproducible runs, entropy otherwise
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Short random id tagging every log event of one invocation
pub(crate) fn run_id() -> String {
    hex::encode(rand::random::<[u8; 4]>())
}

/// Load the config, logging a `config_rejected` event when validation fails
pub(crate) fn load_config(path: Option<&Path>, logger: &StructuredLogger) -> Result<GeneratorConfig> {
    config::load(path).map_err(|err| {
        if let Some(config_err) = err.downcast_ref::<ConfigError>() {
            logger.log_config_rejected(config_err);
        }
        err
    })
}
