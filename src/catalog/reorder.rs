//! Ordering algebra for drag-and-drop reordering.
//!
//! Works on id sequences mirrored from the store. A move removes the item
//! from its old index and reinserts it at the new one, shifting everything in
//! between by one slot. Positions are then re-derived densely for the whole
//! order, not patched incrementally.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("item {0} is not in the current order")]
    UnknownItem(String),
    #[error("anchor item {0} is not in the current order")]
    UnknownAnchor(String),
    #[error("target index {index} is out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Where a dragged item lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    /// Insert immediately before this item.
    Before(String),
    /// Insert at this zero-based index of the resulting order.
    ToIndex(usize),
}

/// Apply one move. Returns `Ok(None)` when the move is a no-op: the item was
/// dropped onto itself or would land back on its own index.
pub fn move_item(
    order: &[String],
    item_id: &str,
    target: &MoveTarget,
) -> Result<Option<Vec<String>>, MoveError> {
    let from = order
        .iter()
        .position(|id| id == item_id)
        .ok_or_else(|| MoveError::UnknownItem(item_id.to_string()))?;

    let to = match target {
        MoveTarget::Before(anchor) => {
            if anchor == item_id {
                return Ok(None);
            }
            let anchor_idx = order
                .iter()
                .position(|id| id == anchor)
                .ok_or_else(|| MoveError::UnknownAnchor(anchor.clone()))?;
            // After the item is pulled out, everything past it shifts left
            if anchor_idx > from {
                anchor_idx - 1
            } else {
                anchor_idx
            }
        }
        MoveTarget::ToIndex(index) => {
            if *index >= order.len() {
                return Err(MoveError::IndexOutOfRange {
                    index: *index,
                    len: order.len(),
                });
            }
            *index
        }
    };

    if to == from {
        return Ok(None);
    }

    let mut next = order.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    Ok(Some(next))
}

/// Dense 1-based positions for the whole order.
pub fn assign_positions(order: &[String]) -> Vec<(String, i64)> {
    order
        .iter()
        .enumerate()
        .map(|(index, id)| (id.clone(), index as i64 + 1))
        .collect()
}

/// True when `proposed` contains exactly the ids of `current`, in any order.
/// Guards the batch-reorder endpoint against stale or partial id lists.
pub fn is_permutation(current: &[String], proposed: &[String]) -> bool {
    if current.len() != proposed.len() {
        return false;
    }
    let mut a: Vec<&String> = current.iter().collect();
    let mut b: Vec<&String> = proposed.iter().collect();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn move_third_to_front() {
        let order = ids(&["a", "b", "c", "d", "e"]);
        let next = move_item(&order, "c", &MoveTarget::ToIndex(0))
            .unwrap()
            .unwrap();
        assert_eq!(next, ids(&["c", "a", "b", "d", "e"]));

        let positions = assign_positions(&next);
        assert_eq!(
            positions,
            vec![
                ("c".to_string(), 1),
                ("a".to_string(), 2),
                ("b".to_string(), 3),
                ("d".to_string(), 4),
                ("e".to_string(), 5),
            ]
        );
    }

    #[test]
    fn move_forward_shifts_between() {
        let order = ids(&["a", "b", "c", "d"]);
        let next = move_item(&order, "a", &MoveTarget::ToIndex(2))
            .unwrap()
            .unwrap();
        assert_eq!(next, ids(&["b", "c", "a", "d"]));
    }

    #[test]
    fn before_anchor_lands_just_before_it() {
        let order = ids(&["a", "b", "c", "d"]);

        // Backward move
        let next = move_item(&order, "d", &MoveTarget::Before("b".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(next, ids(&["a", "d", "b", "c"]));

        // Forward move: anchor index is corrected for the removal shift
        let next = move_item(&order, "a", &MoveTarget::Before("d".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(next, ids(&["b", "c", "a", "d"]));
    }

    #[test]
    fn drop_onto_itself_is_noop() {
        let order = ids(&["a", "b", "c"]);
        assert_eq!(
            move_item(&order, "b", &MoveTarget::Before("b".to_string())).unwrap(),
            None
        );
        assert_eq!(move_item(&order, "b", &MoveTarget::ToIndex(1)).unwrap(), None);
    }

    #[test]
    fn single_item_never_moves() {
        let order = ids(&["a"]);
        assert_eq!(move_item(&order, "a", &MoveTarget::ToIndex(0)).unwrap(), None);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let order = ids(&["a", "b"]);
        assert_eq!(
            move_item(&order, "x", &MoveTarget::ToIndex(0)),
            Err(MoveError::UnknownItem("x".to_string()))
        );
        assert_eq!(
            move_item(&order, "a", &MoveTarget::Before("x".to_string())),
            Err(MoveError::UnknownAnchor("x".to_string()))
        );
        assert_eq!(
            move_item(&order, "a", &MoveTarget::ToIndex(2)),
            Err(MoveError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn permutation_check() {
        let current = ids(&["a", "b", "c"]);
        assert!(is_permutation(&current, &ids(&["c", "a", "b"])));
        assert!(!is_permutation(&current, &ids(&["a", "b"])));
        assert!(!is_permutation(&current, &ids(&["a", "b", "x"])));
        assert!(!is_permutation(&current, &ids(&["a", "b", "b"])));
    }
}
