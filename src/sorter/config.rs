use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::error::{Result, SortError};
use super::features::Feature;

/// Complete configuration for one sorting run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub weights: WeightConfig,
    pub scoring: ScoringMode,
    pub optimizer: OptimizerOptions,
}

/// Per-feature weights (0.0 excludes a feature from the cost).
/// Deserialized through `from_map`, so unknown keys are logged and skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, f64>")]
pub struct WeightConfig {
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub tempo: f64,
    pub loudness: f64,
    pub key: f64,  // circle-of-fifths distance
    pub mode: f64, // major/minor mismatch
}

/// How per-feature distances are combined into one transition cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Weighted sum of absolute differences
    #[default]
    Linear,
    /// Weighted sum of squared differences
    Squared,
}

/// Where the swarm's starting positions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingMode {
    /// Uniformly random permutations
    #[default]
    Random,
    /// Indices ordered by weighted raw feature sum, rotated per particle
    FeatureSum,
}

/// Parameters of the swarm optimizer and the tour construction that seeds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    pub num_particles: usize,
    pub iterations: usize,
    pub random_seed: Option<u64>,
    pub c1: f64, // cognitive (personal best) pull
    pub c2: f64, // social (global best) pull
    pub w_start: f64,
    pub w_end: f64,
    pub seeding: SeedingMode,
    /// Start one particle at the nearest-neighbor tour
    pub seed_with_tour: bool,
    /// Try every start index in tour construction up to this many tracks
    pub exhaustive_start_limit: usize,
    /// Fixed first track for tour construction
    pub start_index: Option<usize>,
    /// Stop after this many iterations without a new global best
    pub stall_iterations: Option<usize>,
    /// Wall-clock cap, checked between iterations
    pub time_limit_ms: Option<u64>,
    pub parallel: bool,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            energy: 0.0,
            valence: 0.0,
            danceability: 0.0,
            tempo: 0.0,
            loudness: 0.0,
            key: 0.0,
            mode: 0.0,
        }
    }
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            num_particles: 30,
            iterations: 100,
            random_seed: None,
            c1: 0.5,
            c2: 0.6,
            w_start: 0.9,
            w_end: 0.4,
            seeding: SeedingMode::Random,
            seed_with_tour: true,
            exhaustive_start_limit: 200,
            start_index: None,
            stall_iterations: None,
            time_limit_ms: None,
            parallel: true,
        }
    }
}

impl From<HashMap<String, f64>> for WeightConfig {
    fn from(map: HashMap<String, f64>) -> Self {
        Self::from_map(&map)
    }
}

impl WeightConfig {
    /// The weighting the legacy sorter shipped with
    pub fn recommended() -> Self {
        Self {
            energy: 3.0,
            valence: 4.0,
            danceability: 2.0,
            key: 3.0,
            ..Default::default()
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Energy => self.energy,
            Feature::Valence => self.valence,
            Feature::Danceability => self.danceability,
            Feature::Tempo => self.tempo,
            Feature::Loudness => self.loudness,
            Feature::Key => self.key,
            Feature::Mode => self.mode,
        }
    }

    pub fn set(&mut self, feature: Feature, weight: f64) {
        let slot = match feature {
            Feature::Energy => &mut self.energy,
            Feature::Valence => &mut self.valence,
            Feature::Danceability => &mut self.danceability,
            Feature::Tempo => &mut self.tempo,
            Feature::Loudness => &mut self.loudness,
            Feature::Key => &mut self.key,
            Feature::Mode => &mut self.mode,
        };
        *slot = weight;
    }

    /// Build from a loose name → weight mapping. Unknown names are skipped.
    pub fn from_map(map: &HashMap<String, f64>) -> Self {
        let mut weights = Self::default();
        for (name, &weight) in map {
            match Feature::from_name(name) {
                Some(feature) => weights.set(feature, weight),
                None => warn!("Ignoring weight for unknown feature '{name}'"),
            }
        }
        weights
    }

    pub fn total(&self) -> f64 {
        Feature::ALL.iter().map(|&f| self.get(f)).sum()
    }

    pub fn is_all_zero(&self) -> bool {
        Feature::ALL.iter().all(|&f| self.get(f) == 0.0)
    }

    pub fn validate(&self) -> Result<()> {
        for feature in Feature::ALL {
            let weight = self.get(feature);
            if !weight.is_finite() || weight < 0.0 {
                return Err(SortError::Configuration(format!(
                    "weight for '{feature}' must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

impl OptimizerOptions {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(SortError::Configuration(
                "num_particles must be at least 1".to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(SortError::Configuration(
                "iterations must be at least 1".to_string(),
            ));
        }
        for (name, value) in [("c1", self.c1), ("c2", self.c2)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SortError::Configuration(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [("w_start", self.w_start), ("w_end", self.w_end)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SortError::Configuration(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if self.stall_iterations == Some(0) {
            return Err(SortError::Configuration(
                "stall_iterations must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

impl SortConfig {
    pub fn with_weights(weights: WeightConfig) -> Self {
        Self {
            weights,
            ..Default::default()
        }
    }

    /// Check everything that can be checked without the tracks
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.optimizer.validate()
    }
}
