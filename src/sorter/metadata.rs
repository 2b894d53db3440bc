use serde::Serialize;

use super::config::WeightConfig;
use super::distance::DistanceMatrix;
use super::features::{Repair, Track};
use super::permutation::Permutation;

/// Which path produced the final ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    /// No tracks
    Empty,
    /// A single track; nothing to order
    Trivial,
    /// Every weight is zero, so every ordering costs the same; input order kept
    InputOrder,
    /// Greedy construction refined by the particle swarm
    Optimized,
}

/// Cost summary of a sorted playlist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortMetadata {
    pub total_tracks: usize,
    /// Path cost of the final ordering
    pub total_cost: f64,
    /// Path cost of the input ordering
    pub input_cost: f64,
    /// Path cost of the greedy tour, when one was built
    pub tour_cost: Option<f64>,
    /// Total cost divided by the sum of weights
    pub normalized_cost: f64,
    pub average_cost_per_track: f64,
}

impl SortMetadata {
    pub fn empty(total_tracks: usize) -> Self {
        Self {
            total_tracks,
            total_cost: 0.0,
            input_cost: 0.0,
            tour_cost: None,
            normalized_cost: 0.0,
            average_cost_per_track: 0.0,
        }
    }

    pub fn calculate(
        matrix: &DistanceMatrix,
        permutation: &Permutation,
        weights: &WeightConfig,
        tour_cost: Option<f64>,
    ) -> Self {
        let total_tracks = permutation.len();
        let total_cost = matrix.path_cost(permutation.as_slice());
        let input_cost = matrix.path_cost(Permutation::identity(total_tracks).as_slice());

        let total_weight = weights.total();
        let normalized_cost = if total_weight > 0.0 {
            total_cost / total_weight
        } else {
            0.0
        };
        let average_cost_per_track = if permutation.is_empty() {
            0.0
        } else {
            normalized_cost / total_tracks as f64
        };

        Self {
            total_tracks,
            total_cost,
            input_cost,
            tour_cost,
            normalized_cost,
            average_cost_per_track,
        }
    }

    /// How much cheaper the final ordering is than the input ordering
    pub fn improvement(&self) -> f64 {
        self.input_cost - self.total_cost
    }
}

/// The engine's answer: the new ordering and every track's new place in it
#[derive(Debug, Clone, Serialize)]
pub struct SortResult {
    /// Track indices in their new playing order
    pub permutation: Permutation,
    /// `new_order[track_index]` is the track's 1-based new position
    pub new_order: Vec<usize>,
    pub strategy: SortStrategy,
    pub metadata: SortMetadata,
    /// Seed the swarm ran with, for reproducing the run
    pub seed: Option<u64>,
    pub iterations_run: usize,
    pub repairs: Vec<Repair>,
    /// Resolved tracks, indexed like the input
    pub tracks: Vec<Track>,
    /// Cost of each step in playing order
    pub transition_costs: Vec<f64>,
}

impl SortResult {
    pub fn new(
        permutation: Permutation,
        strategy: SortStrategy,
        metadata: SortMetadata,
        repairs: Vec<Repair>,
    ) -> Self {
        let new_order = permutation
            .positions()
            .into_iter()
            .map(|slot| slot + 1)
            .collect();
        Self {
            permutation,
            new_order,
            strategy,
            metadata,
            seed: None,
            iterations_run: 0,
            repairs,
            tracks: Vec::new(),
            transition_costs: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(
            Permutation::identity(0),
            SortStrategy::Empty,
            SortMetadata::empty(0),
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_is_one_based_rank() {
        let permutation = Permutation::try_from(vec![2, 0, 1]).unwrap();
        let result = SortResult::new(
            permutation,
            SortStrategy::Optimized,
            SortMetadata::empty(3),
            Vec::new(),
        );
        // Track 2 plays first, track 0 second, track 1 third
        assert_eq!(result.new_order, vec![2, 3, 1]);
    }

    #[test]
    fn test_empty_result() {
        let result = SortResult::empty();
        assert!(result.permutation.is_empty());
        assert!(result.new_order.is_empty());
        assert!(result.transition_costs.is_empty());
        assert_eq!(result.strategy, SortStrategy::Empty);
    }
}
