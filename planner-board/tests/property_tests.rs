//! Property-based tests for the ordering model and reorder engine

use planner_board::position::{is_dense, order, reinsert, renumber};
use planner_board::{reorder, BoardStore, Card, Column, DragItem, DropTarget};
use proptest::prelude::*;

/// Cards of one column with arbitrary (possibly gapped or tied) positions
fn cards_strategy() -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(0usize..50, 0..12).prop_map(|positions| {
        positions
            .into_iter()
            .enumerate()
            .map(|(i, position)| {
                Card::new("b1".into(), "col".into(), format!("card {i}"), position)
                    .with_id(format!("c{i}").as_str())
            })
            .collect()
    })
}

/// A board of 1-4 columns with 0-5 cards each, stored densely
fn board_strategy() -> impl Strategy<Value = BoardStore> {
    prop::collection::vec(0usize..6, 1..5).prop_map(|sizes| {
        let mut columns = Vec::new();
        let mut cards = Vec::new();
        for (col, size) in sizes.into_iter().enumerate() {
            let column_id = format!("l{col}");
            columns.push(
                Column::new("b1".into(), column_id.as_str(), col).with_id(column_id.as_str()),
            );
            for pos in 0..size {
                let id = format!("l{col}c{pos}");
                cards.push(
                    Card::new("b1".into(), column_id.as_str().into(), id.as_str(), pos)
                        .with_id(id.as_str()),
                );
            }
        }
        BoardStore::with_contents("b1", columns, cards)
    })
}

proptest! {
    #[test]
    fn test_renumber_order_renumber_is_idempotent(cards in cards_strategy()) {
        let once = renumber(&order(&cards));
        let twice = renumber(&order(&once));
        prop_assert!(is_dense(&once));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_reinsert_then_renumber_is_dense(
        cards in cards_strategy(),
        from_seed in any::<prop::sample::Index>(),
        to_seed in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!cards.is_empty());
        let ordered = order(&cards);
        let from = from_seed.index(ordered.len());
        let to = to_seed.index(ordered.len());
        let id = ordered[from].id.clone();

        let moved = renumber(&reinsert(&ordered, &id, from, to).unwrap());
        prop_assert!(is_dense(&moved));
        prop_assert_eq!(moved.len(), ordered.len());
        prop_assert_eq!(&moved[to].id, &id);
    }

    #[test]
    fn test_every_hover_keeps_board_dense(
        store in board_strategy(),
        picks in prop::collection::vec(
            (any::<prop::sample::Index>(), any::<prop::sample::Index>(), any::<bool>()),
            1..8,
        ),
    ) {
        let mut store = store;
        for (item_seed, target_seed, after) in picks {
            let card_ids: Vec<_> = store.cards().iter().map(|c| c.id.clone()).collect();
            let column_ids = store.column_ids();

            // Card drags when there are cards, otherwise column drags
            let item = if card_ids.is_empty() {
                DragItem::Column(column_ids[item_seed.index(column_ids.len())].clone())
            } else {
                DragItem::Card(card_ids[item_seed.index(card_ids.len())].clone())
            };
            let targets: Vec<DropTarget> = card_ids
                .iter()
                .cloned()
                .map(DropTarget::Card)
                .chain(column_ids.iter().cloned().map(DropTarget::Column))
                .collect();
            let target = &targets[target_seed.index(targets.len())];

            reorder::apply(&mut store, &item, target, after).unwrap();
            prop_assert!(store.is_dense());
        }
        let total: usize = store.column_ids().iter().map(|c| store.cards_in(c).len()).sum();
        prop_assert_eq!(total, store.cards().len());
    }
}
