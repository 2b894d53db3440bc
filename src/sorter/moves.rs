use serde::Serialize;

use super::error::{Result, SortError};
use super::permutation::Permutation;

/// Take the item at `from` and reinsert it so it ends up at `to`.
/// Positions are 0-based and refer to the list as it is when the move runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReorderMove {
    pub from: usize,
    pub to: usize,
}

/// Turn per-track 1-based `new_order` values into the single-item moves that
/// rearrange the original list into the sorted one, applied in sequence.
pub fn plan_moves(new_order: &[usize]) -> Result<Vec<ReorderMove>> {
    let targets: Vec<usize> = new_order
        .iter()
        .map(|&position| position.checked_sub(1))
        .collect::<Option<_>>()
        .ok_or_else(|| SortError::InvalidInput("new_order positions are 1-based".to_string()))?;
    if !Permutation::is_bijection(&targets) {
        return Err(SortError::InvalidInput(format!(
            "new_order {new_order:?} does not assign each position exactly once"
        )));
    }

    // `current[i]` is the target slot of whatever item sits at position i
    let mut current = targets;
    let mut moves = Vec::new();
    for slot in 0..current.len() {
        let Some(from) = current[slot..].iter().position(|&t| t == slot).map(|p| p + slot) else {
            continue;
        };
        if from != slot {
            let item = current.remove(from);
            current.insert(slot, item);
            moves.push(ReorderMove { from, to: slot });
        }
    }
    Ok(moves)
}

/// Apply moves to a local list, the way a remote playlist would apply them
pub fn apply_moves<T>(items: &mut Vec<T>, moves: &[ReorderMove]) {
    for mv in moves {
        if mv.from < items.len() && mv.to < items.len() {
            let item = items.remove(mv.from);
            items.insert(mv.to, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_reproduce_the_sorted_order() {
        // Original list a,b,c,d,e; sorted order is d,a,e,c,b
        let new_order = vec![2, 5, 4, 1, 3];
        let moves = plan_moves(&new_order).unwrap();

        let mut items = vec!['a', 'b', 'c', 'd', 'e'];
        apply_moves(&mut items, &moves);
        assert_eq!(items, vec!['d', 'a', 'e', 'c', 'b']);
    }

    #[test]
    fn test_already_sorted_needs_no_moves() {
        assert!(plan_moves(&[1, 2, 3, 4]).unwrap().is_empty());
        assert!(plan_moves(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_moves_skip_settled_items() {
        // Only the last item moves to the front
        let moves = plan_moves(&[2, 3, 4, 1]).unwrap();
        assert_eq!(moves, vec![ReorderMove { from: 3, to: 0 }]);
    }

    #[test]
    fn test_invalid_new_order_is_rejected() {
        assert!(matches!(plan_moves(&[0, 1, 2]), Err(SortError::InvalidInput(_))));
        assert!(matches!(plan_moves(&[1, 1, 2]), Err(SortError::InvalidInput(_))));
        assert!(matches!(plan_moves(&[1, 4]), Err(SortError::InvalidInput(_))));
    }

    #[test]
    fn test_every_move_pulls_from_later_in_the_list() {
        let new_order = vec![6, 1, 5, 2, 4, 3];
        for mv in plan_moves(&new_order).unwrap() {
            assert!(mv.from > mv.to);
        }
    }
}
