//! Report row generation
//!
//! Walks a built topology once per reporting interval and emits flat rows
//! with a fixed column set per report kind.

mod emitter;
mod schema;
mod window;

#[cfg(test)]
mod tests;

pub use emitter::{active_seconds, ReportEmitter, UsageRows};
pub use schema::{
    Cell, ReportKind, ReportRow, RowBuilder, NAMESPACE_LABEL_COLUMNS, NODE_LABEL_COLUMNS,
    POD_USAGE_COLUMNS, STORAGE_USAGE_COLUMNS,
};
pub use window::{format_timestamp, hourly, Interval, Intervals, ReportWindow, TIMESTAMP_FORMAT};
