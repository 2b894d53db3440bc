use log::debug;

use super::distance::DistanceMatrix;
use super::error::{Result, SortError};
use super::permutation::Permutation;

/// How the greedy construction chooses its first track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourStrategy {
    /// Start from one given track
    FixedStart(usize),
    /// Try every start and keep the cheapest path
    AllStarts,
}

impl TourStrategy {
    /// Pick a strategy for `n` tracks given an optional fixed start and the
    /// largest track count for which every start is tried
    pub fn for_tracks(n: usize, start_index: Option<usize>, exhaustive_limit: usize) -> Self {
        match start_index {
            Some(start) => TourStrategy::FixedStart(start),
            None if n <= exhaustive_limit => TourStrategy::AllStarts,
            None => TourStrategy::FixedStart(0),
        }
    }
}

/// Greedy nearest-neighbor tour construction
pub struct TourConstructor;

impl TourConstructor {
    pub fn construct(matrix: &DistanceMatrix, strategy: TourStrategy) -> Result<Permutation> {
        match strategy {
            TourStrategy::FixedStart(start) => Self::nearest_neighbor(matrix, start),
            TourStrategy::AllStarts => Ok(Self::best_of_all_starts(matrix)),
        }
    }

    /// Walk from `start`, always stepping to the closest unvisited track.
    /// Ties go to the lowest index.
    pub fn nearest_neighbor(matrix: &DistanceMatrix, start: usize) -> Result<Permutation> {
        if matrix.is_empty() {
            return Ok(Permutation::identity(0));
        }
        let n = matrix.len();
        if start >= n {
            return Err(SortError::InvalidInput(format!(
                "start index {start} is out of range for {n} tracks"
            )));
        }

        let mut visited = vec![false; n];
        let mut tour = Vec::with_capacity(n);
        tour.push(start);
        visited[start] = true;

        while tour.len() < n {
            let current = tour[tour.len() - 1];
            let mut best_next = None;
            let mut best_cost = f64::INFINITY;

            for candidate in 0..n {
                if visited[candidate] {
                    continue;
                }
                let cost = matrix.get(current, candidate);
                if best_next.is_none() || cost < best_cost {
                    best_cost = cost;
                    best_next = Some(candidate);
                }
            }

            let Some(next) = best_next else {
                break;
            };
            tour.push(next);
            visited[next] = true;
        }

        Permutation::try_from(tour)
    }

    /// Run the greedy walk from every start index, keep the cheapest path.
    /// Ties go to the lowest start index.
    pub fn best_of_all_starts(matrix: &DistanceMatrix) -> Permutation {
        let mut best: Option<(Permutation, f64)> = None;
        for start in 0..matrix.len() {
            let Ok(tour) = Self::nearest_neighbor(matrix, start) else {
                continue;
            };
            let cost = matrix.path_cost(tour.as_slice());
            if best.as_ref().is_none_or(|(_, best_cost)| cost < *best_cost) {
                debug!("Start {start} improves greedy tour cost to {cost:.4}");
                best = Some((tour, cost));
            }
        }
        best.map(|(tour, _)| tour)
            .unwrap_or_else(|| Permutation::identity(matrix.len()))
    }
}
