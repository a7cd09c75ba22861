//! Generator configuration
//!
//! `GeneratorConfig` carries the numeric bounds used for randomized
//! topology generation plus an optional attribute override tree. Loading
//! from an untyped value checks every known field's type first and reports
//! all mismatches at once; `validate` does the same for range problems.

use crate::error::{ConfigError, Violation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-date usage values, matched against an interval's calendar date
pub type UsageByDate = BTreeMap<NaiveDate, f64>;

/// Bounds and overrides for one generator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_max_nodes")]
    pub max_nodes: u32,

    #[serde(default = "default_max_node_cpu_cores")]
    pub max_node_cpu_cores: u32,

    #[serde(default = "default_max_node_memory_gig")]
    pub max_node_memory_gig: f64,

    #[serde(default = "default_max_node_labels")]
    pub max_node_labels: u32,

    #[serde(default = "default_max_node_namespaces")]
    pub max_node_namespaces: u32,

    #[serde(default = "default_max_node_namespace_labels")]
    pub max_node_namespace_labels: u32,

    #[serde(default = "default_max_node_namespace_pods")]
    pub max_node_namespace_pods: u32,

    #[serde(default = "default_min_node_namespace_pod_seconds")]
    pub min_node_namespace_pod_seconds: u32,

    #[serde(default = "default_max_node_namespace_pod_seconds")]
    pub max_node_namespace_pod_seconds: u32,

    #[serde(default = "default_max_node_namespace_pod_labels")]
    pub max_node_namespace_pod_labels: u32,

    #[serde(default = "default_max_node_namespace_volumes")]
    pub max_node_namespace_volumes: u32,

    #[serde(default = "default_max_node_namespace_volume_request_gig")]
    pub max_node_namespace_volume_request_gig: u64,

    #[serde(default = "default_max_node_namespace_volume_labels")]
    pub max_node_namespace_volume_labels: u32,

    #[serde(default = "default_max_node_namespace_volume_volume_claims")]
    pub max_node_namespace_volume_volume_claims: u32,

    #[serde(default = "default_max_node_namespace_volume_volume_claim_labels")]
    pub max_node_namespace_volume_volume_claim_labels: u32,

    #[serde(default = "default_max_node_namespace_volume_volume_claim_capacity_gig")]
    pub max_node_namespace_volume_volume_claim_capacity_gig: u64,

    #[serde(default = "default_storage_classes")]
    pub storage_classes: Vec<String>,

    /// Report window start, parsed by `ReportWindow::parse`
    #[serde(default)]
    pub start_date: Option<String>,

    /// Report window end, parsed by `ReportWindow::parse`
    #[serde(default)]
    pub end_date: Option<String>,

    /// Explicit topology; levels left empty fall back to random generation
    #[serde(default)]
    pub nodes: Option<Vec<NodeAttributes>>,
}

fn default_max_nodes() -> u32 {
    6
}

fn default_max_node_cpu_cores() -> u32 {
    16
}

fn default_max_node_memory_gig() -> f64 {
    64.0
}

fn default_max_node_labels() -> u32 {
    5
}

fn default_max_node_namespaces() -> u32 {
    12
}

fn default_max_node_namespace_labels() -> u32 {
    4
}

fn default_max_node_namespace_pods() -> u32 {
    10
}

fn default_min_node_namespace_pod_seconds() -> u32 {
    300
}

fn default_max_node_namespace_pod_seconds() -> u32 {
    3600
}

fn default_max_node_namespace_pod_labels() -> u32 {
    6
}

fn default_max_node_namespace_volumes() -> u32 {
    3
}

fn default_max_node_namespace_volume_request_gig() -> u64 {
    100
}

fn default_max_node_namespace_volume_labels() -> u32 {
    4
}

fn default_max_node_namespace_volume_volume_claims() -> u32 {
    2
}

fn default_max_node_namespace_volume_volume_claim_labels() -> u32 {
    4
}

fn default_max_node_namespace_volume_volume_claim_capacity_gig() -> u64 {
    50
}

fn default_storage_classes() -> Vec<String> {
    ["gp2", "fast", "slow", "gold"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            max_node_cpu_cores: default_max_node_cpu_cores(),
            max_node_memory_gig: default_max_node_memory_gig(),
            max_node_labels: default_max_node_labels(),
            max_node_namespaces: default_max_node_namespaces(),
            max_node_namespace_labels: default_max_node_namespace_labels(),
            max_node_namespace_pods: default_max_node_namespace_pods(),
            min_node_namespace_pod_seconds: default_min_node_namespace_pod_seconds(),
            max_node_namespace_pod_seconds: default_max_node_namespace_pod_seconds(),
            max_node_namespace_pod_labels: default_max_node_namespace_pod_labels(),
            max_node_namespace_volumes: default_max_node_namespace_volumes(),
            max_node_namespace_volume_request_gig: default_max_node_namespace_volume_request_gig(),
            max_node_namespace_volume_labels: default_max_node_namespace_volume_labels(),
            max_node_namespace_volume_volume_claims:
                default_max_node_namespace_volume_volume_claims(),
            max_node_namespace_volume_volume_claim_labels:
                default_max_node_namespace_volume_volume_claim_labels(),
            max_node_namespace_volume_volume_claim_capacity_gig:
                default_max_node_namespace_volume_volume_claim_capacity_gig(),
            storage_classes: default_storage_classes(),
            start_date: None,
            end_date: None,
            nodes: None,
        }
    }
}

/// Explicit node; every `None` is sampled from the config bounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub node_name: Option<String>,
    pub cpu_cores: Option<u32>,
    pub memory_gig: Option<f64>,
    pub resource_id: Option<String>,
    pub node_labels: Option<String>,
    /// Keyed by namespace name; namespaces are built in name order
    pub namespaces: Option<BTreeMap<String, NamespaceAttributes>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceAttributes {
    pub namespace_labels: Option<String>,
    pub pods: Option<Vec<PodAttributes>>,
    pub volumes: Option<Vec<VolumeAttributes>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodAttributes {
    pub pod_name: Option<String>,
    pub cpu_request: Option<f64>,
    pub cpu_limit: Option<f64>,
    pub mem_request_gig: Option<f64>,
    pub mem_limit_gig: Option<f64>,
    pub pod_seconds: Option<u32>,
    pub labels: Option<String>,
    pub cpu_usage: Option<UsageByDate>,
    pub mem_usage_gig: Option<UsageByDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeAttributes {
    pub volume_name: Option<String>,
    pub storage_class: Option<String>,
    pub volume_request_gig: Option<u64>,
    pub labels: Option<String>,
    pub volume_claims: Option<Vec<VolumeClaimAttributes>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeClaimAttributes {
    pub volume_claim_name: Option<String>,
    pub pod_name: Option<String>,
    pub capacity_gig: Option<u64>,
    pub labels: Option<String>,
    pub volume_claim_usage_gig: Option<UsageByDate>,
}

/// JSON shape expected for a config field
#[derive(Debug, Clone, Copy)]
enum Expected {
    U32,
    U64,
    Number,
    Strings,
    Text,
    List,
    Mapping,
    UsageByDate,
}

impl Expected {
    fn matches(self, value: &Value) -> bool {
        match self {
            Expected::U32 | Expected::U64 => value.as_u64().is_some(),
            Expected::Number => value.is_number(),
            Expected::Strings => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
            Expected::Text => value.is_string(),
            Expected::List => value.is_array(),
            Expected::Mapping | Expected::UsageByDate => value.is_object(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Expected::U32 | Expected::U64 => "an unsigned integer",
            Expected::Number => "a number",
            Expected::Strings => "a list of strings",
            Expected::Text => "a string",
            Expected::List => "a list",
            Expected::Mapping => "a mapping",
            Expected::UsageByDate => "a mapping of dates to numbers",
        }
    }

    /// Push every problem with `value` at `path`
    fn check(self, path: String, value: &Value, violations: &mut Vec<Violation>) {
        if !self.matches(value) {
            violations.push(Violation::new(
                path,
                format!("expected {}, found {}", self.describe(), type_name(value)),
            ));
            return;
        }
        match self {
            Expected::U32 => {
                if value.as_u64().is_some_and(|v| u32::try_from(v).is_err()) {
                    violations.push(Violation::new(path, format!("must be at most {}", u32::MAX)));
                }
            }
            Expected::UsageByDate => {
                for (date, usage) in value.as_object().into_iter().flatten() {
                    if date.parse::<NaiveDate>().is_err() {
                        violations.push(Violation::new(
                            format!("{path}[{date}]"),
                            "expected a YYYY-MM-DD date",
                        ));
                    } else if !usage.is_number() {
                        violations.push(Violation::new(
                            format!("{path}[{date}]"),
                            format!("expected a number, found {}", type_name(usage)),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

const FIELD_TYPES: &[(&str, Expected)] = &[
    ("max_nodes", Expected::U32),
    ("max_node_cpu_cores", Expected::U32),
    ("max_node_memory_gig", Expected::Number),
    ("max_node_labels", Expected::U32),
    ("max_node_namespaces", Expected::U32),
    ("max_node_namespace_labels", Expected::U32),
    ("max_node_namespace_pods", Expected::U32),
    ("min_node_namespace_pod_seconds", Expected::U32),
    ("max_node_namespace_pod_seconds", Expected::U32),
    ("max_node_namespace_pod_labels", Expected::U32),
    ("max_node_namespace_volumes", Expected::U32),
    ("max_node_namespace_volume_request_gig", Expected::U64),
    ("max_node_namespace_volume_labels", Expected::U32),
    ("max_node_namespace_volume_volume_claims", Expected::U32),
    ("max_node_namespace_volume_volume_claim_labels", Expected::U32),
    ("max_node_namespace_volume_volume_claim_capacity_gig", Expected::U64),
    ("storage_classes", Expected::Strings),
    ("start_date", Expected::Text),
    ("end_date", Expected::Text),
    ("nodes", Expected::List),
];

const NODE_FIELDS: &[(&str, Expected)] = &[
    ("node_name", Expected::Text),
    ("cpu_cores", Expected::U32),
    ("memory_gig", Expected::Number),
    ("resource_id", Expected::Text),
    ("node_labels", Expected::Text),
    ("namespaces", Expected::Mapping),
];

const NAMESPACE_FIELDS: &[(&str, Expected)] = &[
    ("namespace_labels", Expected::Text),
    ("pods", Expected::List),
    ("volumes", Expected::List),
];

const POD_FIELDS: &[(&str, Expected)] = &[
    ("pod_name", Expected::Text),
    ("cpu_request", Expected::Number),
    ("cpu_limit", Expected::Number),
    ("mem_request_gig", Expected::Number),
    ("mem_limit_gig", Expected::Number),
    ("pod_seconds", Expected::U32),
    ("labels", Expected::Text),
    ("cpu_usage", Expected::UsageByDate),
    ("mem_usage_gig", Expected::UsageByDate),
];

const VOLUME_FIELDS: &[(&str, Expected)] = &[
    ("volume_name", Expected::Text),
    ("storage_class", Expected::Text),
    ("volume_request_gig", Expected::U64),
    ("labels", Expected::Text),
    ("volume_claims", Expected::List),
];

const CLAIM_FIELDS: &[(&str, Expected)] = &[
    ("volume_claim_name", Expected::Text),
    ("pod_name", Expected::Text),
    ("capacity_gig", Expected::U64),
    ("labels", Expected::Text),
    ("volume_claim_usage_gig", Expected::UsageByDate),
];

/// Check one attribute mapping against `fields`. Nested attributes are all
/// optional, so nulls pass. Returns the mapping when it is one.
fn check_attributes<'v>(
    path: &str,
    value: &'v Value,
    fields: &[(&str, Expected)],
    violations: &mut Vec<Violation>,
) -> Option<&'v Map<String, Value>> {
    let Some(map) = value.as_object() else {
        violations.push(Violation::new(
            path,
            format!("expected a mapping, found {}", type_name(value)),
        ));
        return None;
    };
    for (field, expected) in fields {
        match map.get(*field) {
            None | Some(Value::Null) => {}
            Some(found) => expected.check(format!("{path}.{field}"), found, violations),
        }
    }
    Some(map)
}

fn list_items<'v>(
    map: &'v Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = (usize, &'v Value)> {
    map.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
}

/// Walk one node of the attribute tree, collecting every shape problem
fn check_node_shape(path: &str, node: &Value, violations: &mut Vec<Violation>) {
    let Some(node) = check_attributes(path, node, NODE_FIELDS, violations) else {
        return;
    };
    let namespaces = node.get("namespaces").and_then(Value::as_object);
    for (name, ns) in namespaces.into_iter().flatten() {
        let ns_path = format!("{path}.namespaces.{name}");
        let Some(ns) = check_attributes(&ns_path, ns, NAMESPACE_FIELDS, violations) else {
            continue;
        };
        for (i, pod) in list_items(ns, "pods") {
            check_attributes(&format!("{ns_path}.pods[{i}]"), pod, POD_FIELDS, violations);
        }
        for (i, volume) in list_items(ns, "volumes") {
            let volume_path = format!("{ns_path}.volumes[{i}]");
            let Some(volume) = check_attributes(&volume_path, volume, VOLUME_FIELDS, violations)
            else {
                continue;
            };
            for (j, claim) in list_items(volume, "volume_claims") {
                let claim_path = format!("{volume_path}.volume_claims[{j}]");
                check_attributes(&claim_path, claim, CLAIM_FIELDS, violations);
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(n) if n.is_i64() && n.as_u64().is_none() => "negative integer",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

impl GeneratorConfig {
    /// Build a config from an untyped mapping, as produced by a YAML/JSON
    /// loader. Missing fields take their defaults.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Some(map) = value.as_object() else {
            return Err(ConfigError {
                violations: vec![Violation::new(
                    "<root>",
                    format!("expected a mapping, found {}", type_name(&value)),
                )],
            });
        };

        let mut violations = Vec::new();
        for (field, expected) in FIELD_TYPES {
            if let Some(found) = map.get(*field) {
                if found.is_null() && matches!(expected, Expected::Text | Expected::List) {
                    continue;
                }
                expected.check(field.to_string(), found, &mut violations);
            }
        }
        for (i, node) in map.get("nodes").and_then(Value::as_array).into_iter().flatten().enumerate() {
            check_node_shape(&format!("nodes[{i}]"), node, &mut violations);
        }
        ConfigError::check(violations)?;

        let config: GeneratorConfig = serde_json::from_value(value).map_err(|e| ConfigError {
            violations: vec![Violation::new("<root>", e.to_string())],
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every bound and explicit attribute, reporting all problems
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut violations = Vec::new();
        let mut at_least_one = |field: &str, value: u64| {
            if value < 1 {
                violations.push(Violation::new(field, "must be at least 1"));
            }
        };

        at_least_one("max_nodes", self.max_nodes.into());
        at_least_one("max_node_cpu_cores", self.max_node_cpu_cores.into());
        at_least_one("max_node_namespaces", self.max_node_namespaces.into());
        at_least_one("max_node_namespace_pods", self.max_node_namespace_pods.into());
        at_least_one(
            "min_node_namespace_pod_seconds",
            self.min_node_namespace_pod_seconds.into(),
        );
        if self.max_node_namespace_volumes > 0 {
            at_least_one(
                "max_node_namespace_volume_request_gig",
                self.max_node_namespace_volume_request_gig,
            );
            if self.max_node_namespace_volume_volume_claims > 0 {
                at_least_one(
                    "max_node_namespace_volume_volume_claim_capacity_gig",
                    self.max_node_namespace_volume_volume_claim_capacity_gig,
                );
            }
        }

        if !(self.max_node_memory_gig.is_finite() && self.max_node_memory_gig > 0.0) {
            violations.push(Violation::new(
                "max_node_memory_gig",
                "must be a positive number",
            ));
        }
        if self.min_node_namespace_pod_seconds > self.max_node_namespace_pod_seconds {
            violations.push(Violation::new(
                "max_node_namespace_pod_seconds",
                format!(
                    "must not be below min_node_namespace_pod_seconds ({})",
                    self.min_node_namespace_pod_seconds
                ),
            ));
        }
        if self.max_node_namespace_volumes > 0 && self.storage_classes.is_empty() {
            violations.push(Violation::new(
                "storage_classes",
                "must not be empty when volumes can be generated",
            ));
        }

        if let Some(nodes) = &self.nodes {
            for (i, node) in nodes.iter().enumerate() {
                node.collect_violations(&format!("nodes[{i}]"), &mut violations);
            }
        }

        ConfigError::check(violations)
    }
}

fn check_positive(violations: &mut Vec<Violation>, field: String, value: Option<f64>) {
    if let Some(v) = value {
        if !(v.is_finite() && v > 0.0) {
            violations.push(Violation::new(field, "must be a positive number"));
        }
    }
}

fn check_usage(violations: &mut Vec<Violation>, field: String, usage: &Option<UsageByDate>) {
    if let Some(usage) = usage {
        for (date, v) in usage {
            if !(v.is_finite() && *v >= 0.0) {
                violations.push(Violation::new(
                    format!("{field}[{date}]"),
                    "must be a non-negative number",
                ));
            }
        }
    }
}

impl NodeAttributes {
    fn collect_violations(&self, path: &str, violations: &mut Vec<Violation>) {
        if self.cpu_cores == Some(0) {
            violations.push(Violation::new(
                format!("{path}.cpu_cores"),
                "must be at least 1",
            ));
        }
        check_positive(violations, format!("{path}.memory_gig"), self.memory_gig);

        for (name, ns) in self.namespaces.iter().flatten() {
            let ns_path = format!("{path}.namespaces.{name}");
            for (i, pod) in ns.pods.iter().flatten().enumerate() {
                let pod_path = format!("{ns_path}.pods[{i}]");
                check_positive(violations, format!("{pod_path}.cpu_request"), pod.cpu_request);
                check_positive(violations, format!("{pod_path}.cpu_limit"), pod.cpu_limit);
                check_positive(
                    violations,
                    format!("{pod_path}.mem_request_gig"),
                    pod.mem_request_gig,
                );
                check_positive(
                    violations,
                    format!("{pod_path}.mem_limit_gig"),
                    pod.mem_limit_gig,
                );
                if pod.pod_seconds == Some(0) {
                    violations.push(Violation::new(
                        format!("{pod_path}.pod_seconds"),
                        "must be at least 1",
                    ));
                }
                check_usage(violations, format!("{pod_path}.cpu_usage"), &pod.cpu_usage);
                check_usage(
                    violations,
                    format!("{pod_path}.mem_usage_gig"),
                    &pod.mem_usage_gig,
                );
            }
            for (i, volume) in ns.volumes.iter().flatten().enumerate() {
                let volume_path = format!("{ns_path}.volumes[{i}]");
                if volume.volume_request_gig == Some(0) {
                    violations.push(Violation::new(
                        format!("{volume_path}.volume_request_gig"),
                        "must be at least 1",
                    ));
                }
                for (j, claim) in volume.volume_claims.iter().flatten().enumerate() {
                    let claim_path = format!("{volume_path}.volume_claims[{j}]");
                    if claim.capacity_gig == Some(0) {
                        violations.push(Violation::new(
                            format!("{claim_path}.capacity_gig"),
                            "must be at least 1",
                        ));
                    }
                    check_usage(
                        violations,
                        format!("{claim_path}.volume_claim_usage_gig"),
                        &claim.volume_claim_usage_gig,
                    );
                }
            }
        }
    }
}
