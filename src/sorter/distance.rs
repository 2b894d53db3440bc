use rayon::prelude::*;

use super::config::{ScoringMode, WeightConfig};
use super::features::{AudioFeatures, Feature, FeatureRange, FeatureStore, Mode, Track};
use super::permutation::Permutation;

/// Key distance between tracks in different modes whose keys differ
pub const MODE_MISMATCH_KEY_PENALTY: f64 = 1.0;

/// Position of a key on the circle of fifths (C=0, G=1, D=2, ...).
/// Minor keys sit with their relative major, three semitones up.
pub fn fifths_position(key: u8, mode: Mode) -> u8 {
    let tonic = match mode {
        Mode::Major => key % 12,
        Mode::Minor => (key % 12 + 3) % 12,
    };
    (tonic * 7) % 12
}

/// Key compatibility in `[0, 1]`: shortest walk around the circle of fifths
/// divided by the longest possible walk (6 steps)
pub fn key_distance(a: &AudioFeatures, b: &AudioFeatures) -> f64 {
    if a.mode != b.mode {
        return if a.key == b.key { 0.0 } else { MODE_MISMATCH_KEY_PENALTY };
    }
    let pa = i32::from(fifths_position(a.key, a.mode));
    let pb = i32::from(fifths_position(b.key, b.mode));
    let steps = (pa - pb).abs();
    f64::from(steps.min(12 - steps)) / 6.0
}

/// Weighted transition cost between two tracks
#[derive(Debug, Clone)]
pub struct DistanceModel {
    weights: WeightConfig,
    scoring: ScoringMode,
    ranges: Vec<(Feature, FeatureRange)>,
}

impl DistanceModel {
    pub fn new(store: &FeatureStore, weights: WeightConfig, scoring: ScoringMode) -> Self {
        let ranges = Feature::LINEAR
            .into_iter()
            .filter_map(|feature| store.range(feature).map(|range| (feature, range)))
            .collect();
        Self {
            weights,
            scoring,
            ranges,
        }
    }

    /// Unweighted distance of one feature, in `[0, 1]`
    pub fn feature_distance(&self, feature: Feature, a: &Track, b: &Track) -> f64 {
        match feature {
            Feature::Key => key_distance(&a.features, &b.features),
            Feature::Mode => {
                if a.features.mode == b.features.mode { 0.0 } else { 1.0 }
            }
            _ => self
                .ranges
                .iter()
                .find(|(f, _)| *f == feature)
                .map(|(_, range)| {
                    (range.normalize(a.features.value(feature))
                        - range.normalize(b.features.value(feature)))
                    .abs()
                })
                .unwrap_or(0.0),
        }
    }

    /// Symmetric, non-negative, zero for identical tracks
    pub fn cost(&self, a: &Track, b: &Track) -> f64 {
        Feature::ALL
            .iter()
            .filter(|&&feature| self.weights.get(feature) > 0.0)
            .map(|&feature| {
                let distance = self.feature_distance(feature, a, b);
                let term = match self.scoring {
                    ScoringMode::Linear => distance,
                    ScoringMode::Squared => distance * distance,
                };
                self.weights.get(feature) * term
            })
            .sum()
    }
}

/// Precomputed pairwise costs. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn build(store: &FeatureStore, model: &DistanceModel) -> Self {
        let tracks = store.tracks();
        let n = tracks.len();
        let rows: Vec<Vec<f64>> = tracks
            .par_iter()
            .map(|a| {
                tracks
                    .iter()
                    .map(|b| if a.index == b.index { 0.0 } else { model.cost(a, b) })
                    .collect()
            })
            .collect();
        Self {
            n,
            values: rows.concat(),
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Cost of each step along an open path
    pub fn transition_costs(&self, order: &[usize]) -> Vec<f64> {
        order.windows(2).map(|pair| self.get(pair[0], pair[1])).collect()
    }

    /// Sum of transition costs along an open path
    pub fn path_cost(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|pair| self.get(pair[0], pair[1])).sum()
    }

    /// Higher is better: the negated path cost
    pub fn fitness(&self, permutation: &Permutation) -> f64 {
        -self.path_cost(permutation.as_slice())
    }

    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|&value| value == 0.0)
    }
}
