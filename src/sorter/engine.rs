use log::{info, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::config::{SeedingMode, SortConfig};
use super::distance::{DistanceMatrix, DistanceModel};
use super::error::{Result, SortError};
use super::features::FeatureStore;
use super::metadata::{SortMetadata, SortResult, SortStrategy};
use super::permutation::Permutation;
use super::swarm::SwarmOptimizer;
use super::tour::{TourConstructor, TourStrategy};
use crate::models::TrackRecord;

/// Sort `records` with `config` in one call
pub fn optimize(records: &[TrackRecord], config: &SortConfig) -> Result<SortResult> {
    PlaylistSorter::new(config.clone())?.sort(records)
}

/// Drives tour construction and swarm refinement for one configuration
pub struct PlaylistSorter {
    config: SortConfig,
}

impl PlaylistSorter {
    /// Rejects invalid weights and optimizer settings up front
    pub fn new(config: SortConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn sort(&self, records: &[TrackRecord]) -> Result<SortResult> {
        let store = FeatureStore::from_records(records);
        self.sort_store(&store)
    }

    pub fn sort_store(&self, store: &FeatureStore) -> Result<SortResult> {
        let mut result = self.order(store)?;
        result.tracks = store.tracks().to_vec();
        Ok(result)
    }

    fn order(&self, store: &FeatureStore) -> Result<SortResult> {
        let n = store.len();
        let options = &self.config.optimizer;
        let weights = &self.config.weights;
        let repairs = store.repairs().to_vec();

        if store.is_empty() {
            info!("No tracks to sort");
            return Ok(SortResult::empty());
        }
        if let Some(start) = options.start_index {
            if start >= n {
                return Err(SortError::InvalidInput(format!(
                    "start_index {start} is out of range for {n} tracks"
                )));
            }
        }
        if n < 2 {
            info!("Single track, nothing to reorder");
            return Ok(SortResult::new(
                Permutation::identity(n),
                SortStrategy::Trivial,
                SortMetadata::empty(n),
                repairs,
            ));
        }

        let model = DistanceModel::new(store, weights.clone(), self.config.scoring);
        let matrix = DistanceMatrix::build(store, &model);

        if weights.is_all_zero() || matrix.is_all_zero() {
            if weights.is_all_zero() {
                warn!("All feature weights are zero; every ordering costs the same, keeping input order");
            } else {
                warn!("Tracks are indistinguishable on the weighted features, keeping input order");
            }
            let permutation = Permutation::identity(n);
            let metadata = SortMetadata::calculate(&matrix, &permutation, weights, None);
            let transition_costs = matrix.transition_costs(permutation.as_slice());
            let mut result =
                SortResult::new(permutation, SortStrategy::InputOrder, metadata, repairs);
            result.transition_costs = transition_costs;
            return Ok(result);
        }

        let tour = if options.seed_with_tour {
            let strategy =
                TourStrategy::for_tracks(n, options.start_index, options.exhaustive_start_limit);
            let tour = TourConstructor::construct(&matrix, strategy)?;
            info!(
                "Greedy tour ({strategy:?}) costs {:.4}",
                matrix.path_cost(tour.as_slice())
            );
            Some(tour)
        } else {
            None
        };

        let seed = options
            .random_seed
            .unwrap_or_else(|| rand::thread_rng().next_u64());
        info!(
            "Running swarm: {} particles, {} iterations, seed {seed}",
            options.num_particles, options.iterations
        );
        let mut rng = StdRng::seed_from_u64(seed);

        let proxy_order = match options.seeding {
            SeedingMode::FeatureSum => Some(store.feature_sum_order(weights)),
            SeedingMode::Random => None,
        };
        let optimizer = SwarmOptimizer::new(&matrix, options);
        let initial = optimizer.initial_positions(proxy_order.as_ref(), tour.as_ref(), &mut rng);
        let outcome = optimizer.run(initial, &mut rng);
        let starting_cost = outcome.fitness_history.first().map_or(0.0, |f| -f);
        info!(
            "Swarm finished after {} iterations ({:?}), best cost {:.4} from {:.4}",
            outcome.iterations_run, outcome.stop_reason, -outcome.best_fitness, starting_cost
        );

        let tour_cost = tour.as_ref().map(|t| matrix.path_cost(t.as_slice()));
        let metadata = SortMetadata::calculate(&matrix, &outcome.best, weights, tour_cost);
        let transition_costs = matrix.transition_costs(outcome.best.as_slice());
        let mut result = SortResult::new(outcome.best, SortStrategy::Optimized, metadata, repairs);
        result.seed = Some(seed);
        result.iterations_run = outcome.iterations_run;
        result.transition_costs = transition_costs;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorter::config::{OptimizerOptions, WeightConfig};
    use crate::sorter::features::Feature;
    use approx::assert_relative_eq;

    fn energy_records(energies: &[f64]) -> Vec<TrackRecord> {
        energies
            .iter()
            .enumerate()
            .map(|(i, &energy)| {
                TrackRecord::new(&format!("id-{i}"), &format!("Track {i}"))
                    .with(Feature::Energy, energy)
                    .with(Feature::Key, 0.0)
                    .with(Feature::Mode, 1.0)
            })
            .collect()
    }

    fn quick_config(weights: WeightConfig) -> SortConfig {
        SortConfig {
            weights,
            optimizer: OptimizerOptions {
                num_particles: 8,
                iterations: 30,
                random_seed: Some(99),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_before_sorting() {
        let mut config = quick_config(WeightConfig::recommended());
        config.weights.tempo = -1.0;
        assert!(matches!(
            PlaylistSorter::new(config),
            Err(SortError::Configuration(_))
        ));

        let mut config = quick_config(WeightConfig::recommended());
        config.optimizer.iterations = 0;
        assert!(matches!(optimize(&[], &config), Err(SortError::Configuration(_))));
    }

    #[test]
    fn test_identical_tracks_keep_input_order() {
        let config = quick_config(WeightConfig::recommended());
        let result = optimize(&energy_records(&[0.4, 0.4, 0.4]), &config).unwrap();

        assert_eq!(result.strategy, SortStrategy::InputOrder);
        assert_eq!(result.new_order, vec![1, 2, 3]);
        assert_eq!(result.iterations_run, 0);
    }

    #[test]
    fn test_out_of_range_start_index() {
        let mut config = quick_config(WeightConfig::recommended());
        config.optimizer.start_index = Some(5);
        let result = optimize(&energy_records(&[0.1, 0.2, 0.3]), &config);
        assert!(matches!(result, Err(SortError::InvalidInput(_))));
    }

    #[test]
    fn test_result_never_worse_than_greedy_tour() {
        let config = quick_config(WeightConfig {
            energy: 1.0,
            ..Default::default()
        });
        let records = energy_records(&[0.9, 0.1, 0.5, 0.3, 0.7, 0.2, 0.8]);
        let result = optimize(&records, &config).unwrap();

        let tour_cost = result.metadata.tour_cost.unwrap();
        assert!(result.metadata.total_cost <= tour_cost);
        assert_eq!(result.strategy, SortStrategy::Optimized);
        assert_eq!(result.seed, Some(99));
        assert_eq!(result.iterations_run, 30);
        assert_eq!(result.tracks.len(), records.len());
        assert_eq!(result.transition_costs.len(), records.len() - 1);
        assert_relative_eq!(
            result.transition_costs.iter().sum::<f64>(),
            result.metadata.total_cost,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_without_tour_seeding() {
        let mut config = quick_config(WeightConfig {
            energy: 1.0,
            ..Default::default()
        });
        config.optimizer.seed_with_tour = false;
        config.optimizer.seeding = SeedingMode::FeatureSum;
        let result = optimize(&energy_records(&[0.9, 0.1, 0.5, 0.3]), &config).unwrap();

        assert!(result.permutation.is_valid());
        assert!(result.metadata.tour_cost.is_none());
    }

    #[test]
    fn test_unseeded_run_reports_its_seed() {
        let mut config = quick_config(WeightConfig::recommended());
        config.optimizer.random_seed = None;
        let records = energy_records(&[0.4, 0.6, 0.2]);
        let first = optimize(&records, &config).unwrap();

        config.optimizer.random_seed = first.seed;
        let replay = optimize(&records, &config).unwrap();
        assert_eq!(first.permutation, replay.permutation);
    }
}
