//! Core data models for the synthetic OCP topology

use crate::config::UsageByDate;
use crate::units::gig_to_bytes;
use serde::{Deserialize, Serialize};

/// A synthetic compute host; owns its namespaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub cpu_cores: u32,
    pub memory_gig: f64,
    pub memory_bytes: u64,
    pub resource_id: String,
    pub labels: String,
    pub namespaces: Vec<Namespace>,
}

/// Pods and volumes grouped under one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub labels: String,
    pub pods: Vec<Pod>,
    pub volumes: Vec<Volume>,
}

/// Workload with CPU (cores) and memory (GiB) request, limit and usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    pub cpu_request: f64,
    pub cpu_limit: f64,
    pub mem_request_gig: f64,
    pub mem_limit_gig: f64,
    /// Seconds the pod is active within each interval
    pub pod_seconds: u32,
    pub labels: String,
    #[serde(default, skip_serializing_if = "UsageByDate::is_empty")]
    pub cpu_usage: UsageByDate,
    #[serde(default, skip_serializing_if = "UsageByDate::is_empty")]
    pub mem_usage_gig: UsageByDate,
}

/// Persistent volume with its consumer-side claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub storage_class: String,
    pub volume_request_gig: u64,
    pub labels: String,
    pub volume_claims: Vec<VolumeClaim>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeClaim {
    pub name: String,
    /// Pod in the same namespace that mounts this claim
    pub pod_name: String,
    pub capacity_gig: u64,
    pub labels: String,
    #[serde(default, skip_serializing_if = "UsageByDate::is_empty")]
    pub usage_gig: UsageByDate,
}

/// The fully built node tree for one generator run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<Node>,
}

/// Entity counts, used for logging and metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TopologySummary {
    pub nodes: usize,
    pub namespaces: usize,
    pub pods: usize,
    pub volumes: usize,
    pub volume_claims: usize,
}

impl Node {
    pub fn memory_bytes_for(memory_gig: f64) -> u64 {
        gig_to_bytes(memory_gig)
    }
}

impl Namespace {
    pub fn pod(&self, name: &str) -> Option<&Pod> {
        self.pods.iter().find(|p| p.name == name)
    }
}

impl Volume {
    /// Sum of claim capacities attached to this volume
    pub fn claimed_gig(&self) -> u64 {
        self.volume_claims.iter().map(|c| c.capacity_gig).sum()
    }
}

impl Topology {
    pub fn summary(&self) -> TopologySummary {
        let namespaces = || self.nodes.iter().flat_map(|n| n.namespaces.iter());
        let volumes = || namespaces().flat_map(|ns| ns.volumes.iter());
        TopologySummary {
            nodes: self.nodes.len(),
            namespaces: namespaces().count(),
            pods: namespaces().map(|ns| ns.pods.len()).sum(),
            volumes: volumes().count(),
            volume_claims: volumes().map(|v| v.volume_claims.len()).sum(),
        }
    }

    /// Every (node, namespace, pod) triple in tree order
    pub fn pods(&self) -> impl Iterator<Item = (&Node, &Namespace, &Pod)> {
        self.nodes.iter().flat_map(|node| {
            node.namespaces
                .iter()
                .flat_map(move |ns| ns.pods.iter().map(move |pod| (node, ns, pod)))
        })
    }

    /// Every (node, namespace) pair in tree order
    pub fn namespaces(&self) -> impl Iterator<Item = (&Node, &Namespace)> {
        self.nodes
            .iter()
            .flat_map(|node| node.namespaces.iter().map(move |ns| (node, ns)))
    }

    /// Every (namespace, volume, claim) triple in tree order
    pub fn volume_claims(&self) -> impl Iterator<Item = (&Namespace, &Volume, &VolumeClaim)> {
        self.namespaces().flat_map(|(_, ns)| {
            ns.volumes
                .iter()
                .flat_map(move |vol| vol.volume_claims.iter().map(move |claim| (ns, vol, claim)))
        })
    }
}
