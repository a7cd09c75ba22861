//! Top-down construction of the node tree

use super::resolve::{resolve_level, CountBounds};
use super::sampling::{pod_resources, sample_up_to, split_capacity};
use crate::config::{
    GeneratorConfig, NamespaceAttributes, NodeAttributes, PodAttributes, VolumeAttributes,
    VolumeClaimAttributes,
};
use crate::error::{Result, TopologyError};
use crate::models::{Namespace, Node, Pod, Topology, Volume, VolumeClaim};
use crate::naming::{generate_labels, unique_name, NameTemplate};
use crate::registry::{NamePool, NameRegistry};
use crate::units::GIG_DECIMALS;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

const NODE_NAME: NameTemplate<'static> = NameTemplate::words(2).with_prefix("node");
const RESOURCE_ID: NameTemplate<'static> = NameTemplate::words(2).with_prefix("i");
const NAMESPACE_NAME: NameTemplate<'static> = NameTemplate::words(2);
const POD_NAME: NameTemplate<'static> = NameTemplate::words(2).with_prefix("pod");
const VOLUME_NAME: NameTemplate<'static> = NameTemplate::words(2).with_prefix("pv");
const CLAIM_NAME: NameTemplate<'static> = NameTemplate::words(2).with_prefix("pvc");

/// Used for explicit volumes when no storage class is configured
const FALLBACK_STORAGE_CLASS: &str = "standard";

/// Smallest randomly sized node, in GiB
const MIN_NODE_MEMORY_GIG: f64 = 1.0;

/// Builds a `Topology` from a `GeneratorConfig`
pub struct TopologyBuilder<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Build the whole tree. Fails without a partial result if the config
    /// is invalid or an explicit claim names a pod that does not exist.
    pub fn build<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut NameRegistry,
    ) -> Result<Topology> {
        self.config.validate()?;

        let plan = resolve_level(
            self.config.nodes.clone(),
            CountBounds::new(1, self.config.max_nodes),
        );
        let explicit = plan.is_explicit();

        let nodes = plan
            .into_items(rng)
            .into_iter()
            .map(|attrs| self.build_node(rng, registry, attrs))
            .collect::<Result<Vec<_>>>()?;

        let topology = Topology { nodes };
        let summary = topology.summary();
        info!(
            explicit_nodes = explicit,
            nodes = summary.nodes,
            namespaces = summary.namespaces,
            pods = summary.pods,
            volumes = summary.volumes,
            volume_claims = summary.volume_claims,
            "Built synthetic topology"
        );
        Ok(topology)
    }

    fn build_node<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut NameRegistry,
        attrs: NodeAttributes,
    ) -> Result<Node> {
        let name = named(rng, registry, NamePool::Resources, attrs.node_name, NODE_NAME);
        let cpu_cores = attrs
            .cpu_cores
            .unwrap_or_else(|| rng.gen_range(1..=self.config.max_node_cpu_cores));
        let memory_gig = attrs.memory_gig.unwrap_or_else(|| {
            sample_up_to(
                rng,
                MIN_NODE_MEMORY_GIG,
                self.config.max_node_memory_gig,
                GIG_DECIMALS,
            )
        });
        let resource_id = named(rng, registry, NamePool::Resources, attrs.resource_id, RESOURCE_ID);
        let labels = attrs
            .node_labels
            .unwrap_or_else(|| generate_labels(rng, self.config.max_node_labels));

        let plan = resolve_level(
            attrs
                .namespaces
                .map(|namespaces| namespaces.into_iter().map(|(name, ns)| (Some(name), ns))),
            CountBounds::new(1, self.config.max_node_namespaces),
        );
        let namespaces = plan
            .into_items(rng)
            .into_iter()
            .map(|(name, ns)| self.build_namespace(rng, registry, name, ns, cpu_cores, memory_gig))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            node = %name,
            cpu_cores = cpu_cores,
            memory_gig = memory_gig,
            namespaces = namespaces.len(),
            "Built node"
        );

        Ok(Node {
            name,
            cpu_cores,
            memory_gig,
            memory_bytes: Node::memory_bytes_for(memory_gig),
            resource_id,
            labels,
            namespaces,
        })
    }

    fn build_namespace<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut NameRegistry,
        name: Option<String>,
        attrs: NamespaceAttributes,
        node_cpu_cores: u32,
        node_memory_gig: f64,
    ) -> Result<Namespace> {
        let name = named(rng, registry, NamePool::Namespaces, name, NAMESPACE_NAME);
        let labels = attrs
            .namespace_labels
            .unwrap_or_else(|| generate_labels(rng, self.config.max_node_namespace_labels));

        let pods: Vec<Pod> = resolve_level(
            attrs.pods,
            CountBounds::new(1, self.config.max_node_namespace_pods),
        )
        .into_items(rng)
        .into_iter()
        .map(|pod| self.build_pod(rng, registry, pod, node_cpu_cores, node_memory_gig))
        .collect();

        let volumes = resolve_level(
            attrs.volumes,
            CountBounds::new(0, self.config.max_node_namespace_volumes),
        )
        .into_items(rng)
        .into_iter()
        .map(|volume| self.build_volume(rng, registry, volume, &name, &pods))
        .collect::<Result<Vec<_>>>()?;

        Ok(Namespace {
            name,
            labels,
            pods,
            volumes,
        })
    }

    fn build_pod<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut NameRegistry,
        attrs: PodAttributes,
        node_cpu_cores: u32,
        node_memory_gig: f64,
    ) -> Pod {
        let name = named(rng, registry, NamePool::Resources, attrs.pod_name.clone(), POD_NAME);
        let resources = pod_resources(rng, &attrs, f64::from(node_cpu_cores), node_memory_gig);
        let pod_seconds = attrs.pod_seconds.unwrap_or_else(|| {
            rng.gen_range(
                self.config.min_node_namespace_pod_seconds
                    ..=self.config.max_node_namespace_pod_seconds,
            )
        });
        let labels = attrs
            .labels
            .unwrap_or_else(|| generate_labels(rng, self.config.max_node_namespace_pod_labels));

        Pod {
            name,
            cpu_request: resources.cpu_request,
            cpu_limit: resources.cpu_limit,
            mem_request_gig: resources.mem_request_gig,
            mem_limit_gig: resources.mem_limit_gig,
            pod_seconds,
            labels,
            cpu_usage: attrs.cpu_usage.unwrap_or_default(),
            mem_usage_gig: attrs.mem_usage_gig.unwrap_or_default(),
        }
    }

    fn build_volume<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut NameRegistry,
        attrs: VolumeAttributes,
        namespace: &str,
        pods: &[Pod],
    ) -> Result<Volume> {
        let name = named(rng, registry, NamePool::Resources, attrs.volume_name, VOLUME_NAME);
        let storage_class = attrs.storage_class.unwrap_or_else(|| {
            self.config
                .storage_classes
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| FALLBACK_STORAGE_CLASS.to_string())
        });
        let volume_request_gig = attrs.volume_request_gig.unwrap_or_else(|| {
            rng.gen_range(1..=self.config.max_node_namespace_volume_request_gig.max(1))
        });
        let labels = attrs
            .labels
            .unwrap_or_else(|| generate_labels(rng, self.config.max_node_namespace_volume_labels));

        let volume_claims = match attrs.volume_claims.filter(|claims| !claims.is_empty()) {
            Some(claims) => {
                self.explicit_claims(rng, registry, claims, namespace, pods, volume_request_gig)?
            }
            None => self.random_claims(rng, registry, pods, volume_request_gig),
        };

        Ok(Volume {
            name,
            storage_class,
            volume_request_gig,
            labels,
            volume_claims,
        })
    }

    /// Claims taken from attributes, in order. Capacities are clamped so the
    /// running total never exceeds the volume request.
    fn explicit_claims<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut NameRegistry,
        claims: Vec<VolumeClaimAttributes>,
        namespace: &str,
        pods: &[Pod],
        volume_request_gig: u64,
    ) -> Result<Vec<VolumeClaim>> {
        let max_claim_gig = self.config.max_node_namespace_volume_volume_claim_capacity_gig;
        let mut remaining = volume_request_gig;
        let mut built = Vec::with_capacity(claims.len());

        for attrs in claims {
            let name = named(rng, registry, NamePool::Resources, attrs.volume_claim_name, CLAIM_NAME);
            let pod_name = match attrs.pod_name {
                Some(pod) if pods.iter().any(|p| p.name == pod) => pod,
                Some(pod) => {
                    return Err(TopologyError::UnknownPod {
                        namespace: namespace.to_string(),
                        claim: name,
                        pod,
                    }
                    .into())
                }
                None => match pods.choose(rng) {
                    Some(pod) => pod.name.clone(),
                    None => continue,
                },
            };
            let capacity_gig = match attrs.capacity_gig {
                Some(gig) => gig.min(remaining),
                None if remaining == 0 => 0,
                None => rng.gen_range(1..=remaining.min(max_claim_gig.max(1))),
            };
            remaining -= capacity_gig;

            built.push(VolumeClaim {
                name,
                pod_name,
                capacity_gig,
                labels: attrs.labels.unwrap_or_else(|| {
                    generate_labels(
                        rng,
                        self.config.max_node_namespace_volume_volume_claim_labels,
                    )
                }),
                usage_gig: attrs.volume_claim_usage_gig.unwrap_or_default(),
            });
        }
        Ok(built)
    }

    fn random_claims<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut NameRegistry,
        pods: &[Pod],
        volume_request_gig: u64,
    ) -> Vec<VolumeClaim> {
        if pods.is_empty() {
            return Vec::new();
        }
        let count =
            CountBounds::new(1, self.config.max_node_namespace_volume_volume_claims).sample(rng);
        let capacities = split_capacity(
            rng,
            volume_request_gig,
            count,
            self.config.max_node_namespace_volume_volume_claim_capacity_gig,
        );

        capacities
            .into_iter()
            .filter_map(|capacity_gig| {
                let pod = pods.choose(rng)?;
                Some(VolumeClaim {
                    name: unique_name(rng, registry, NamePool::Resources, CLAIM_NAME),
                    pod_name: pod.name.clone(),
                    capacity_gig,
                    labels: generate_labels(
                        rng,
                        self.config.max_node_namespace_volume_volume_claim_labels,
                    ),
                    usage_gig: Default::default(),
                })
            })
            .collect()
    }
}

/// Use the explicit name if given (recording it in the pool), otherwise
/// generate a fresh unique one.
fn named<R: Rng + ?Sized>(
    rng: &mut R,
    registry: &mut NameRegistry,
    pool: NamePool,
    explicit: Option<String>,
    template: NameTemplate<'_>,
) -> String {
    match explicit {
        Some(name) => {
            registry.claim(pool, name.clone());
            name
        }
        None => unique_name(rng, registry, pool, template),
    }
}
