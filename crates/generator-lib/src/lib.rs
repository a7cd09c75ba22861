//! Synthetic OpenShift cost-usage fixture generator
//!
//! This crate provides the core functionality for:
//! - Building a randomized node/namespace/pod/volume topology from bounds
//!   and optional pinned attributes
//! - Flattening the topology into hourly pod, storage and label report rows
//! - Writing the rows as CSV or JSON together with a manifest sidecar
//! - Run metrics and structured logging

pub mod config;
pub mod error;
pub mod models;
pub mod naming;
pub mod observability;
pub mod output;
pub mod registry;
pub mod report;
pub mod topology;
pub mod units;

pub use config::GeneratorConfig;
pub use error::{ConfigError, Error, Result, TopologyError, Violation, WindowError};
pub use models::*;
pub use observability::{GeneratorMetrics, StructuredLogger};
pub use output::{Manifest, OutputFormat, ReportWriter, WrittenReport};
pub use registry::{NamePool, NameRegistry};
pub use report::{ReportEmitter, ReportKind, ReportRow, ReportWindow};
pub use topology::TopologyBuilder;
