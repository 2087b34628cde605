//! Optimistic reorder engine.
//!
//! Applies one "over" decision to the [`BoardStore`] in place. Every
//! container touched is renumbered densely before returning, so the store is
//! renderable after each call.

use crate::drag::{DragItem, DropTarget};
use crate::error::{BoardError, Result};
use crate::position::{index_of, reinsert, renumber};
use crate::store::BoardStore;
use crate::types::{CardId, ColumnId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What an over decision did to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "placement", rename_all = "snake_case")]
pub enum Placement {
    /// Nothing moved
    Unchanged,
    CardMoved {
        card: CardId,
        from_column: ColumnId,
        to_column: ColumnId,
        index: usize,
    },
    ColumnMoved {
        column: ColumnId,
        index: usize,
    },
}

/// Recompute placement of `item` for the hovered `target`.
///
/// `insert_after` is only consulted for a card hovering a card in another
/// column. Within a column the dragged card simply takes the hovered card's
/// index.
pub fn apply(
    store: &mut BoardStore,
    item: &DragItem,
    target: &DropTarget,
    insert_after: bool,
) -> Result<Placement> {
    let placement = match (item, target) {
        (DragItem::Card(card), DropTarget::Card(hovered)) => {
            card_over_card(store, card, hovered, insert_after)?
        }
        (DragItem::Card(card), DropTarget::Column(column)) => {
            card_over_column(store, card, column)?
        }
        (DragItem::Column(column), DropTarget::Column(hovered)) => {
            column_over_column(store, column, hovered)?
        }
        (DragItem::Column(column), DropTarget::Card(hovered)) => {
            let owner = store
                .card(hovered)
                .map(|c| c.column_id.clone())
                .ok_or_else(|| BoardError::card_not_found(hovered))?;
            column_over_column(store, column, &owner)?
        }
    };

    debug!(item = %item, target = %target, insert_after, ?placement, "over");
    Ok(placement)
}

fn card_over_card(
    store: &mut BoardStore,
    card: &CardId,
    hovered: &CardId,
    insert_after: bool,
) -> Result<Placement> {
    let from_column = owning_column(store, card)?;
    let to_column = owning_column(store, hovered)?;
    if card == hovered {
        return Ok(Placement::Unchanged);
    }

    if from_column == to_column {
        let cards = store.cards_in(&from_column);
        let from = index_of(&cards, card).ok_or_else(|| BoardError::card_not_found(card))?;
        let to = index_of(&cards, hovered).ok_or_else(|| BoardError::card_not_found(hovered))?;
        if from == to {
            return Ok(Placement::Unchanged);
        }
        let moved = reinsert(&cards, card, from, to)?;
        store.write_cards(renumber(&moved))?;
        return Ok(Placement::CardMoved {
            card: card.clone(),
            from_column: from_column.clone(),
            to_column: from_column,
            index: to,
        });
    }

    let destination = store.cards_in(&to_column);
    let hovered_index =
        index_of(&destination, hovered).ok_or_else(|| BoardError::card_not_found(hovered))?;
    let index = if insert_after {
        hovered_index + 1
    } else {
        hovered_index
    };
    move_across(store, card, from_column, to_column, index)
}

fn card_over_column(store: &mut BoardStore, card: &CardId, column: &ColumnId) -> Result<Placement> {
    if store.column(column).is_none() {
        return Err(BoardError::column_not_found(column));
    }
    let from_column = owning_column(store, card)?;
    if &from_column == column {
        return Ok(Placement::Unchanged);
    }
    let index = store.cards_in(column).len();
    move_across(store, card, from_column, column.clone(), index)
}

/// Take `card` out of its column and splice it into `to_column` at `index`
fn move_across(
    store: &mut BoardStore,
    card: &CardId,
    from_column: ColumnId,
    to_column: ColumnId,
    index: usize,
) -> Result<Placement> {
    let mut source = store.cards_in(&from_column);
    let from = index_of(&source, card).ok_or_else(|| BoardError::card_not_found(card))?;
    let mut moving = source.remove(from);
    moving.column_id = to_column.clone();

    let mut destination = store.cards_in(&to_column);
    if index > destination.len() {
        return Err(BoardError::IndexOutOfBounds {
            index,
            len: destination.len(),
        });
    }
    destination.insert(index, moving);

    store.write_cards(renumber(&source))?;
    store.write_cards(renumber(&destination))?;
    Ok(Placement::CardMoved {
        card: card.clone(),
        from_column,
        to_column,
        index,
    })
}

fn column_over_column(
    store: &mut BoardStore,
    column: &ColumnId,
    hovered: &ColumnId,
) -> Result<Placement> {
    let columns = store.columns().to_vec();
    let from = index_of(&columns, column).ok_or_else(|| BoardError::column_not_found(column))?;
    let to = index_of(&columns, hovered).ok_or_else(|| BoardError::column_not_found(hovered))?;
    if from == to {
        return Ok(Placement::Unchanged);
    }
    let moved = reinsert(&columns, column, from, to)?;
    store.replace_columns(renumber(&moved))?;
    Ok(Placement::ColumnMoved {
        column: column.clone(),
        index: to,
    })
}

fn owning_column(store: &BoardStore, card: &CardId) -> Result<ColumnId> {
    store
        .card(card)
        .map(|c| c.column_id.clone())
        .ok_or_else(|| BoardError::card_not_found(card))
}
