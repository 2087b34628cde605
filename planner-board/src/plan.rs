//! Sync plans: the server calls a finished drop needs.
//!
//! A plan is derived by diffing the pre-drag snapshot against the store after
//! the drop. Payloads carry full ordered id lists taken from the already
//! updated store, so reorder calls can be replayed in any order.

use crate::drag::DragItem;
use crate::error::{BoardError, Result};
use crate::store::{BoardSnapshot, BoardStore};
use crate::types::{BoardId, CardId, ColumnId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The container a call writes to. At most one call per key is meaningful at
/// any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SyncKey {
    Card(CardId),
    Column(ColumnId),
    Board(BoardId),
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card(id) => write!(f, "card:{id}"),
            Self::Column(id) => write!(f, "column:{id}"),
            Self::Board(id) => write!(f, "board:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SyncCall {
    /// `PUT /cards/{id}` with the new `listId`
    AssignColumn { card: CardId, column: ColumnId },
    /// `PUT /cards/reorder`
    ReorderCards {
        column: ColumnId,
        ordered_ids: Vec<CardId>,
    },
    /// `PUT /lists/reorder`
    ReorderColumns {
        board: BoardId,
        ordered_ids: Vec<ColumnId>,
    },
}

impl SyncCall {
    pub fn key(&self) -> SyncKey {
        match self {
            Self::AssignColumn { card, .. } => SyncKey::Card(card.clone()),
            Self::ReorderCards { column, .. } => SyncKey::Column(column.clone()),
            Self::ReorderColumns { board, .. } => SyncKey::Board(board.clone()),
        }
    }

    /// The container to refetch if this call fails
    pub fn stale_container(&self) -> SyncKey {
        match self {
            Self::AssignColumn { column, .. } => SyncKey::Column(column.clone()),
            other => other.key(),
        }
    }
}

/// Calls for one drop, in issue order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub calls: Vec<SyncCall>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncCall> {
        self.calls.iter()
    }
}

impl IntoIterator for SyncPlan {
    type Item = SyncCall;
    type IntoIter = std::vec::IntoIter<SyncCall>;

    fn into_iter(self) -> Self::IntoIter {
        self.calls.into_iter()
    }
}

/// Derive the minimal calls for a drop of `item`.
///
/// Column reassignment comes first, then the destination column, the source
/// column, and any other column whose members or positions changed during
/// the drag. A column drop yields a single board reorder when the order
/// changed.
pub fn derive(before: &BoardSnapshot, after: &BoardStore, item: &DragItem) -> Result<SyncPlan> {
    let mut calls = Vec::new();

    match item {
        DragItem::Card(card) => {
            let from = before
                .card(card)
                .map(|c| c.column_id.clone())
                .ok_or_else(|| BoardError::card_not_found(card))?;
            let to = after
                .card(card)
                .map(|c| c.column_id.clone())
                .ok_or_else(|| BoardError::card_not_found(card))?;

            if from != to {
                calls.push(SyncCall::AssignColumn {
                    card: card.clone(),
                    column: to.clone(),
                });
            }

            let mut touched = vec![to.clone()];
            if from != to {
                touched.push(from);
            }
            let others: Vec<ColumnId> = after
                .columns()
                .iter()
                .map(|c| c.id.clone())
                .filter(|id| !touched.contains(id))
                .collect();
            touched.extend(others);

            for column in touched {
                if before.cards_in(&column) != after.cards_in(&column) {
                    calls.push(SyncCall::ReorderCards {
                        ordered_ids: after.card_ids_in(&column),
                        column,
                    });
                }
            }
        }
        DragItem::Column(_) => {
            if before.columns() != after.columns() {
                calls.push(SyncCall::ReorderColumns {
                    board: after.board_id().clone(),
                    ordered_ids: after.column_ids(),
                });
            }
        }
    }

    Ok(SyncPlan { calls })
}
