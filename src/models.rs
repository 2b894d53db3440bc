use serde::{Deserialize, Serialize};

use crate::sorter::Feature;

/// A track record as handed over by whatever fetched the playlist.
/// Feature values are kept raw here; `FeatureStore` resolves them once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(alias = "uri", default)]
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub energy: Option<RawValue>,
    #[serde(default)]
    pub valence: Option<RawValue>,
    #[serde(default)]
    pub danceability: Option<RawValue>,
    #[serde(default)]
    pub tempo: Option<RawValue>,
    #[serde(default)]
    pub loudness: Option<RawValue>,
    #[serde(default)]
    pub key: Option<RawValue>,
    #[serde(default)]
    pub mode: Option<RawValue>,
}

fn default_name() -> String {
    "Unknown".to_string()
}

/// A feature value exactly as it appeared in the source data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl RawValue {
    /// Interpret the value as a finite number, if it is one
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Flag(flag) => f64::from(u8::from(*flag)),
            RawValue::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl TrackRecord {
    pub fn raw(&self, feature: Feature) -> Option<&RawValue> {
        match feature {
            Feature::Energy => self.energy.as_ref(),
            Feature::Valence => self.valence.as_ref(),
            Feature::Danceability => self.danceability.as_ref(),
            Feature::Tempo => self.tempo.as_ref(),
            Feature::Loudness => self.loudness.as_ref(),
            Feature::Key => self.key.as_ref(),
            Feature::Mode => self.mode.as_ref(),
        }
    }
}

#[cfg(test)]
impl TrackRecord {
    pub fn set(&mut self, feature: Feature, value: Option<RawValue>) {
        let slot = match feature {
            Feature::Energy => &mut self.energy,
            Feature::Valence => &mut self.valence,
            Feature::Danceability => &mut self.danceability,
            Feature::Tempo => &mut self.tempo,
            Feature::Loudness => &mut self.loudness,
            Feature::Key => &mut self.key,
            Feature::Mode => &mut self.mode,
        };
        *slot = value;
    }

    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder-style numeric feature assignment
    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, Some(RawValue::Number(value)));
        self
    }
}
