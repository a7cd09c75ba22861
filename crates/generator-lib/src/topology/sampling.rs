//! Bounded random draws that keep the resource ordering intact
//!
//! For every pod: usage <= limit <= request <= node capacity, for CPU and
//! memory alike. For every volume: the claims' capacities sum to at most the
//! volume request.

use crate::config::PodAttributes;
use crate::units::{round_down, CPU_DECIMALS, GIG_DECIMALS};
use rand::Rng;

/// Smallest sampled CPU quantity, in cores
pub const CPU_FLOOR: f64 = 0.02;

/// Smallest sampled memory quantity, in GiB
pub const MEM_FLOOR_GIG: f64 = 0.25;

/// Smallest sampled storage usage, in GiB
pub const STORAGE_FLOOR_GIG: f64 = 1.0;

/// Draw uniformly from `[floor, ceiling]`, rounded down to `decimals`.
/// A ceiling below the floor lowers the floor to the ceiling, so the
/// result never exceeds `ceiling`.
pub fn sample_up_to<R: Rng + ?Sized>(rng: &mut R, floor: f64, ceiling: f64, decimals: i32) -> f64 {
    let ceiling = ceiling.max(0.0);
    let floor = floor.min(ceiling);
    if ceiling <= floor {
        return ceiling;
    }
    round_down(rng.gen_range(floor..=ceiling), decimals).clamp(floor, ceiling)
}

/// Requests and limits for one pod
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PodResources {
    pub cpu_request: f64,
    pub cpu_limit: f64,
    pub mem_request_gig: f64,
    pub mem_limit_gig: f64,
}

/// Resolve a pod's requests and limits against its node. Explicit values
/// are clamped into place; missing ones are sampled below their bound.
/// Each pod is checked against the node on its own; siblings do not share
/// capacity.
pub fn pod_resources<R: Rng + ?Sized>(
    rng: &mut R,
    attrs: &PodAttributes,
    node_cpu_cores: f64,
    node_memory_gig: f64,
) -> PodResources {
    let cpu_request = match attrs.cpu_request {
        Some(v) => v.min(node_cpu_cores),
        None => sample_up_to(rng, CPU_FLOOR, node_cpu_cores, CPU_DECIMALS),
    };
    let cpu_limit = match attrs.cpu_limit {
        Some(v) => v.min(cpu_request),
        None => sample_up_to(rng, CPU_FLOOR, cpu_request, CPU_DECIMALS),
    };
    let mem_request_gig = match attrs.mem_request_gig {
        Some(v) => v.min(node_memory_gig),
        None => sample_up_to(rng, MEM_FLOOR_GIG, node_memory_gig, GIG_DECIMALS),
    };
    let mem_limit_gig = match attrs.mem_limit_gig {
        Some(v) => v.min(mem_request_gig),
        None => sample_up_to(rng, MEM_FLOOR_GIG, mem_request_gig, GIG_DECIMALS),
    };

    PodResources {
        cpu_request,
        cpu_limit,
        mem_request_gig,
        mem_limit_gig,
    }
}

/// Split `request_gig` into at most `count` claim capacities of at least
/// 1 GiB each and at most `max_claim_gig`, summing to no more than the
/// request.
pub fn split_capacity<R: Rng + ?Sized>(
    rng: &mut R,
    request_gig: u64,
    count: usize,
    max_claim_gig: u64,
) -> Vec<u64> {
    if max_claim_gig == 0 {
        return Vec::new();
    }
    let count = (count as u64).min(request_gig);
    let mut remaining = request_gig;
    let mut capacities = Vec::with_capacity(count as usize);
    for i in 0..count {
        // Leave at least 1 GiB for every claim still to come.
        let reserved = count - i - 1;
        let upper = (remaining - reserved).min(max_claim_gig);
        let capacity = rng.gen_range(1..=upper);
        remaining -= capacity;
        capacities.push(capacity);
    }
    capacities
}
