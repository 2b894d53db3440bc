pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod features;
pub mod metadata;
pub mod moves;
pub mod permutation;
pub mod swarm;
pub mod tour;

#[cfg(test)]
mod config_tests;

pub use config::{SortConfig, WeightConfig};
pub use engine::optimize;
pub use features::{AudioFeatures, Feature, Repair};
pub use metadata::{SortMetadata, SortResult, SortStrategy};
pub use moves::{ReorderMove, apply_moves, plan_moves};
