use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::error::{Result, SortError};

/// An ordering of the track indices `0..N`, each appearing exactly once.
/// Slot `i` holds the index of the track played `i`-th.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Permutation(Vec<usize>);

impl Permutation {
    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        Self(order)
    }

    /// Project an arbitrary vector back onto the permutation set by ranking
    /// its entries (`argsort(argsort(values))`). Ties keep slot order.
    pub fn from_ranking(values: &[f64]) -> Self {
        let order = Self::sorted_by_value(values);
        let mut ranks = vec![0; values.len()];
        for (rank, &slot) in order.0.iter().enumerate() {
            ranks[slot] = rank;
        }
        Self(ranks)
    }

    /// Indices of `values` in ascending value order, ties by index
    pub fn sorted_by_value(values: &[f64]) -> Self {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));
        Self(order)
    }

    pub fn is_bijection(values: &[usize]) -> bool {
        let mut seen = vec![false; values.len()];
        for &value in values {
            match seen.get_mut(value) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }

    pub fn is_valid(&self) -> bool {
        Self::is_bijection(&self.0)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Slot of every track: `positions()[track] == slot`
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.0.len()];
        for (slot, &track) in self.0.iter().enumerate() {
            positions[track] = slot;
        }
        positions
    }

    /// The same ordering started `k` slots later, wrapping around
    pub fn rotated(&self, k: usize) -> Self {
        let mut order = self.0.clone();
        if !order.is_empty() {
            let shift = k % order.len();
            order.rotate_left(shift);
        }
        Self(order)
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = SortError;

    fn try_from(values: Vec<usize>) -> Result<Self> {
        if Self::is_bijection(&values) {
            Ok(Self(values))
        } else {
            Err(SortError::InvalidInput(format!(
                "{values:?} is not a permutation of 0..{}",
                values.len()
            )))
        }
    }
}

impl From<Permutation> for Vec<usize> {
    fn from(permutation: Permutation) -> Self {
        permutation.0
    }
}
