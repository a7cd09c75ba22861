//! Synthetic topology construction
//!
//! This module builds the node → namespace → pod/volume → volume-claim tree:
//! - Per-level resolution between explicit attributes and randomized bounds
//! - Invariant-preserving sampling of CPU, memory and storage quantities
//! - The `TopologyBuilder` that walks the levels top-down

mod builder;
mod resolve;
mod sampling;


pub use builder::TopologyBuilder;
pub use resolve::{resolve_level, CountBounds, LevelPlan};
pub use sampling::{
    pod_resources, sample_up_to, split_capacity, PodResources, CPU_FLOOR, MEM_FLOOR_GIG,
    STORAGE_FLOOR_GIG,
};
