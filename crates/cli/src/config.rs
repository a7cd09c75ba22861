//! Configuration loading for the CLI
//!
//! An optional YAML/JSON/TOML file is layered under `COSTGEN_*` environment
//! variables, then handed to the generator as untyped JSON so every type
//! problem is reported at once.

use anyhow::{Context, Result};
use generator_lib::GeneratorConfig;
use std::path::Path;

/// Environment variable prefix, e.g. `COSTGEN_MAX_NODES=3`
pub const ENV_PREFIX: &str = "COSTGEN";

/// Merge the config file (if any) and environment into one JSON value
pub fn load_raw(path: Option<&Path>) -> Result<serde_json::Value> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    let merged = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("storage_classes"),
        )
        .build()
        .with_context(|| match path {
            Some(path) => format!("Failed to load config file {}", path.display()),
            None => "Failed to read COSTGEN_* environment".to_string(),
        })?;

    merged
        .try_deserialize::<serde_json::Value>()
        .context("Failed to convert configuration to JSON")
}

/// Load and validate a generator config. Validation problems come back as a
/// `ConfigError` inside the anyhow error so callers can downcast it.
pub fn load(path: Option<&Path>) -> Result<GeneratorConfig> {
    let raw = load_raw(path)?;
    Ok(GeneratorConfig::from_value(raw)?)
}
