use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::sorter::{
    AudioFeatures, ReorderMove, Repair, SortConfig, SortMetadata, SortResult, SortStrategy,
    apply_moves, optimize, plan_moves,
};
use crate::source::TrackSource;

/// One track in its new place
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub id: String,
    pub old_order: usize,
    pub new_order: usize,
    pub features: AudioFeatures,
}

/// The step from one track to the next with its weighted cost
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} --> {} ({:.3})", self.from, self.to, self.cost)
    }
}

/// Everything a sorting run produced, in the shape written to disk
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    pub generated_at: DateTime<Utc>,
    pub strategy: SortStrategy,
    pub seed: Option<u64>,
    pub iterations_run: usize,
    pub metadata: SortMetadata,
    /// Rows in the new playing order
    pub tracks: Vec<ReportRow>,
    pub transitions: Vec<Transition>,
    pub moves: Vec<ReorderMove>,
    pub repairs: Vec<Repair>,
}

impl SortReport {
    pub fn build(result: SortResult) -> Result<Self> {
        let ordered: Vec<_> = result
            .permutation
            .as_slice()
            .iter()
            .map(|&index| &result.tracks[index])
            .collect();

        let rows = ordered
            .iter()
            .map(|track| ReportRow {
                name: track.name.clone(),
                id: track.id.clone(),
                old_order: track.original_position,
                new_order: result.new_order[track.index],
                features: track.features,
            })
            .collect();

        let transitions = ordered
            .windows(2)
            .zip(&result.transition_costs)
            .map(|(pair, &cost)| Transition {
                from: pair[0].name.clone(),
                to: pair[1].name.clone(),
                cost,
            })
            .collect();

        let moves = plan_moves(&result.new_order).context("Sorted order is not a permutation")?;

        // Replaying the moves on the input order must land on the sorted order
        let mut replayed: Vec<usize> = (0..result.new_order.len()).collect();
        apply_moves(&mut replayed, &moves);
        if replayed != result.permutation.as_slice() {
            bail!("Reorder moves do not reproduce the sorted order");
        }

        Ok(Self {
            generated_at: Utc::now(),
            strategy: result.strategy,
            seed: result.seed,
            iterations_run: result.iterations_run,
            metadata: result.metadata,
            tracks: rows,
            transitions,
            moves,
            repairs: result.repairs,
        })
    }
}

/// Load tracks from `source`, sort them and assemble the report
pub fn sort_playlist(source: &dyn TrackSource, config: &SortConfig) -> Result<SortReport> {
    let records = source
        .load_tracks()
        .with_context(|| format!("Failed to load tracks from {}", source.describe()))?;
    info!("Loaded {} tracks from {}", records.len(), source.describe());

    let result = optimize(&records, config)?;
    SortReport::build(result)
}
