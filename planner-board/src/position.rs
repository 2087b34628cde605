//! Position model: pure functions over ordered sequences.
//!
//! A container's members are held as a slice in render order. `position` is
//! the persisted integer index; only [`renumber`] writes it.

use crate::error::{BoardError, Result};
use crate::types::Positioned;
use std::collections::HashSet;

/// Sort a sequence ascending by `position`.
///
/// The sort is stable: members sharing a position keep their input order.
pub fn order<T: Positioned>(sequence: &[T]) -> Vec<T> {
    let mut ordered = sequence.to_vec();
    ordered.sort_by_key(|item| item.position());
    ordered
}

/// Move the item at `from` to `to` in a copy of the sequence.
///
/// Indices are sequence indices, not positions. Positions are left untouched;
/// call [`renumber`] afterwards.
pub fn reinsert<T: Positioned>(
    sequence: &[T],
    item_id: &T::Id,
    from: usize,
    to: usize,
) -> Result<Vec<T>> {
    ensure_unique(sequence)?;

    let len = sequence.len();
    for index in [from, to] {
        if index >= len {
            return Err(BoardError::IndexOutOfBounds { index, len });
        }
    }

    let found = sequence[from].id();
    if found != item_id {
        return Err(BoardError::ItemMismatch {
            expected: item_id.to_string(),
            found: found.to_string(),
            index: from,
        });
    }

    let mut moved = sequence.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Ok(moved)
}

/// Copy the sequence with each `position` set to its index.
pub fn renumber<T: Positioned>(sequence: &[T]) -> Vec<T> {
    sequence
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut item = item.clone();
            item.set_position(index);
            item
        })
        .collect()
}

/// Whether the positions form exactly `{0, …, n-1}`
pub fn is_dense<T: Positioned>(sequence: &[T]) -> bool {
    let mut positions: Vec<usize> = sequence.iter().map(Positioned::position).collect();
    positions.sort_unstable();
    positions.iter().enumerate().all(|(index, &pos)| index == pos)
}

/// Position for a newly created member: one past the current maximum
pub fn next_position<T: Positioned>(sequence: &[T]) -> usize {
    sequence
        .iter()
        .map(Positioned::position)
        .max()
        .map(|max| max + 1)
        .unwrap_or(0)
}

/// Index of the item with the given id
pub fn index_of<T: Positioned>(sequence: &[T], id: &T::Id) -> Option<usize> {
    sequence.iter().position(|item| item.id() == id)
}

/// Reject sequences that contain the same id twice
pub fn ensure_unique<T: Positioned>(sequence: &[T]) -> Result<()> {
    let mut seen = HashSet::with_capacity(sequence.len());
    for item in sequence {
        if !seen.insert(item.id()) {
            return Err(BoardError::duplicate_id(T::KIND, item.id()));
        }
    }
    Ok(())
}
