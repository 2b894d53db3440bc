use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::config::WeightConfig;
use super::permutation::Permutation;
use crate::models::{RawValue, TrackRecord};

/// Loudness range used when the playlist itself gives no spread (dB)
pub const LOUDNESS_FALLBACK_RANGE: FeatureRange = FeatureRange { min: -60.0, max: 0.0 };

/// The audio attributes the sorter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Energy,
    Valence,
    Danceability,
    Tempo,
    Loudness,
    Key,
    Mode,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::Energy,
        Feature::Valence,
        Feature::Danceability,
        Feature::Tempo,
        Feature::Loudness,
        Feature::Key,
        Feature::Mode,
    ];

    /// Features compared by normalized absolute difference
    pub const LINEAR: [Feature; 5] = [
        Feature::Energy,
        Feature::Valence,
        Feature::Danceability,
        Feature::Tempo,
        Feature::Loudness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Energy => "energy",
            Feature::Valence => "valence",
            Feature::Danceability => "danceability",
            Feature::Tempo => "tempo",
            Feature::Loudness => "loudness",
            Feature::Key => "key",
            Feature::Mode => "mode",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|feature| feature.name() == name)
    }

    fn linear_index(self) -> Option<usize> {
        Self::LINEAR.iter().position(|&feature| feature == self)
    }

    /// Whether a parsed number is a legal value for this feature
    fn accepts(self, value: f64) -> bool {
        match self {
            Feature::Key => value.fract() == 0.0 && (0.0..=11.0).contains(&value),
            Feature::Mode => value == 0.0 || value == 1.0,
            _ => true,
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Musical mode, encoded 0 = minor, 1 = major in the source data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Minor,
    Major,
}

impl Mode {
    fn from_value(value: f64) -> Self {
        if value >= 1.0 { Mode::Major } else { Mode::Minor }
    }

    pub fn as_value(self) -> f64 {
        match self {
            Mode::Minor => 0.0,
            Mode::Major => 1.0,
        }
    }
}

/// Resolved, fully numeric features of one track
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub tempo: f64,
    pub loudness: f64,
    pub key: u8,
    pub mode: Mode,
}

impl AudioFeatures {
    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Energy => self.energy,
            Feature::Valence => self.valence,
            Feature::Danceability => self.danceability,
            Feature::Tempo => self.tempo,
            Feature::Loudness => self.loudness,
            Feature::Key => f64::from(self.key),
            Feature::Mode => self.mode.as_value(),
        }
    }
}

/// A track as seen by the engine. Immutable once the store is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    /// Stable index into the store, `0..N`
    pub index: usize,
    /// 1-based position in the input
    pub original_position: usize,
    pub id: String,
    pub name: String,
    pub features: AudioFeatures,
}

/// Observed min/max of one linear feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Map a value into `[0, 1]`; a zero span maps everything to 0.
    /// Works on halved values so `max - min` cannot overflow to infinity.
    pub fn normalize(&self, value: f64) -> f64 {
        let half_span = self.max / 2.0 - self.min / 2.0;
        if half_span > 0.0 {
            ((value / 2.0 - self.min / 2.0) / half_span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn observe(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if values.is_empty() {
            Self { min: 0.0, max: 0.0 }
        } else {
            Self { min, max }
        }
    }
}

/// Why a feature value had to be replaced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairReason {
    Missing,
    NotNumeric(String),
    OutOfRange(f64),
}

/// A feature value that was replaced with a neutral default
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repair {
    pub track_index: usize,
    pub track_name: String,
    pub feature: Feature,
    pub reason: RepairReason,
    pub replacement: f64,
}

enum Parsed {
    Valid(f64),
    Invalid(RepairReason),
}

fn parse_field(feature: Feature, raw: Option<&RawValue>) -> Parsed {
    let Some(raw) = raw else {
        return Parsed::Invalid(RepairReason::Missing);
    };
    match raw.as_number() {
        Some(value) if feature.accepts(value) => Parsed::Valid(value),
        Some(value) => Parsed::Invalid(RepairReason::OutOfRange(value)),
        None => match raw {
            RawValue::Text(text) => Parsed::Invalid(RepairReason::NotNumeric(text.clone())),
            _ => Parsed::Invalid(RepairReason::NotNumeric(format!("{raw:?}"))),
        },
    }
}

/// Neutral replacement for a column: the mean for continuous features,
/// the most frequent value for key and mode, 0 when nothing is valid
fn neutral_value(feature: Feature, valid: &[f64]) -> f64 {
    if valid.is_empty() {
        return 0.0;
    }
    match feature {
        Feature::Key | Feature::Mode => {
            let mut counts: HashMap<i64, usize> = HashMap::new();
            for value in valid {
                *counts.entry(*value as i64).or_insert(0) += 1;
            }
            counts
                .into_iter()
                .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then(vb.cmp(va)))
                .map(|(value, _)| value as f64)
                .unwrap_or(0.0)
        }
        // Divide before summing so huge finite values cannot overflow
        _ => {
            let n = valid.len() as f64;
            valid.iter().map(|value| value / n).sum()
        }
    }
}

/// Uniform numeric feature table built from raw records
#[derive(Debug, Clone)]
pub struct FeatureStore {
    tracks: Vec<Track>,
    ranges: [FeatureRange; 5],
    repairs: Vec<Repair>,
}

impl FeatureStore {
    /// Resolve every record into a `Track`. Never fails: bad fields are
    /// replaced with a neutral value and recorded as a `Repair`.
    pub fn from_records(records: &[TrackRecord]) -> Self {
        let mut repairs = Vec::new();
        let mut columns: HashMap<Feature, Vec<f64>> = HashMap::new();

        for feature in Feature::ALL {
            let parsed: Vec<Parsed> = records
                .iter()
                .map(|record| parse_field(feature, record.raw(feature)))
                .collect();
            let valid: Vec<f64> = parsed
                .iter()
                .filter_map(|p| match p {
                    Parsed::Valid(value) => Some(*value),
                    Parsed::Invalid(_) => None,
                })
                .collect();
            let fallback = neutral_value(feature, &valid);

            let column = parsed
                .into_iter()
                .enumerate()
                .map(|(index, p)| match p {
                    Parsed::Valid(value) => value,
                    Parsed::Invalid(reason) => {
                        let track_name = records[index].name.clone();
                        warn!(
                            "Track {} ('{}'): {} is {:?}, using {:.3}",
                            index + 1,
                            track_name,
                            feature,
                            reason,
                            fallback
                        );
                        repairs.push(Repair {
                            track_index: index,
                            track_name,
                            feature,
                            reason,
                            replacement: fallback,
                        });
                        fallback
                    }
                })
                .collect();
            columns.insert(feature, column);
        }

        let column = |feature: Feature| columns.get(&feature).map(Vec::as_slice).unwrap_or(&[]);
        let tracks: Vec<Track> = records
            .iter()
            .enumerate()
            .map(|(index, record)| Track {
                index,
                original_position: index + 1,
                id: record.id.clone(),
                name: record.name.clone(),
                features: AudioFeatures {
                    energy: column(Feature::Energy)[index],
                    valence: column(Feature::Valence)[index],
                    danceability: column(Feature::Danceability)[index],
                    tempo: column(Feature::Tempo)[index],
                    loudness: column(Feature::Loudness)[index],
                    key: column(Feature::Key)[index] as u8,
                    mode: Mode::from_value(column(Feature::Mode)[index]),
                },
            })
            .collect();

        let ranges = Feature::LINEAR.map(|feature| {
            let range = FeatureRange::observe(column(feature));
            if feature == Feature::Loudness && range.span() <= 0.0 {
                LOUDNESS_FALLBACK_RANGE
            } else {
                range
            }
        });

        debug!(
            "Built feature store with {} tracks and {} repaired values",
            tracks.len(),
            repairs.len()
        );

        Self { tracks, ranges, repairs }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn repairs(&self) -> &[Repair] {
        &self.repairs
    }

    /// Range of a linear feature; `None` for key and mode
    pub fn range(&self, feature: Feature) -> Option<FeatureRange> {
        feature.linear_index().map(|i| self.ranges[i])
    }

    /// Cheap static ordering: indices sorted by their weighted raw feature sum
    pub fn feature_sum_order(&self, weights: &WeightConfig) -> Permutation {
        let sums: Vec<f64> = self
            .tracks
            .iter()
            .map(|track| {
                Feature::ALL
                    .iter()
                    .map(|&feature| weights.get(feature) * track.features.value(feature))
                    .sum()
            })
            .collect();
        Permutation::sorted_by_value(&sums)
    }
}
