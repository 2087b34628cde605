//! Integration tests for full drag gestures against a board store

use planner_board::{
    BoardStore, Card, CardId, Column, ColumnId, DragConfig, DragController, DragEffect, DragItem,
    DropTarget, Hover, Point, Rect, SyncCall,
};

const CARD_HEIGHT: f64 = 40.0;
const COLUMN_WIDTH: f64 = 280.0;

/// Build a board with one column per entry, each holding the given card ids
fn board(layout: &[(&str, &[&str])]) -> BoardStore {
    let mut columns = Vec::new();
    let mut cards = Vec::new();
    for (column_index, (column, members)) in layout.iter().enumerate() {
        columns.push(Column::new("b1".into(), *column, column_index).with_id(*column));
        for (index, id) in members.iter().enumerate() {
            cards.push(Card::new("b1".into(), (*column).into(), *id, index).with_id(*id));
        }
    }
    BoardStore::with_contents("b1", columns, cards)
}

fn column_bounds(store: &BoardStore, column: &str) -> Rect {
    let index = store
        .column_ids()
        .iter()
        .position(|id| id.as_str() == column)
        .unwrap();
    Rect::new(index as f64 * COLUMN_WIDTH, 0.0, COLUMN_WIDTH, 800.0)
}

fn card_bounds(store: &BoardStore, card: &str) -> Rect {
    let found = store.card(&card.into()).unwrap();
    let column = column_bounds(store, found.column_id.as_str());
    Rect::new(
        column.left,
        found.position as f64 * CARD_HEIGHT,
        COLUMN_WIDTH,
        CARD_HEIGHT,
    )
}

fn hover_card(store: &BoardStore, card: &str) -> Option<Hover> {
    Some(Hover::new(
        DropTarget::Card(card.into()),
        card_bounds(store, card),
    ))
}

fn hover_column(store: &BoardStore, column: &str) -> Option<Hover> {
    Some(Hover::new(
        DropTarget::Column(column.into()),
        column_bounds(store, column),
    ))
}

/// Press on an item and move far enough to start dragging
fn pick_up(controller: &mut DragController, item: DragItem) {
    controller.pointer_down(item, Point::new(1.0, 1.0)).unwrap();
    let response = controller.pointer_move(Point::new(1.0, 20.0), None).unwrap();
    assert!(matches!(response.effect(), DragEffect::DragStarted { .. }));
}

fn ids(store: &BoardStore, column: &str) -> Vec<String> {
    store
        .card_ids_in(&column.into())
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn positions(store: &BoardStore, column: &str) -> Vec<usize> {
    store
        .cards_in(&column.into())
        .iter()
        .map(|c| c.position)
        .collect()
}

#[test]
fn test_card_to_end_of_other_column() {
    let store = board(&[("a", &["a1", "a2", "a3"]), ("b", &["b1", "b2"])]);
    let mut controller = DragController::new(store, DragConfig::default()).unwrap();

    pick_up(&mut controller, DragItem::Card("a2".into()));
    let target = hover_column(controller.store(), "b");
    controller
        .pointer_move(Point::new(400.0, 500.0), target.clone())
        .unwrap();
    let response = controller.pointer_up(Point::new(400.0, 500.0), target).unwrap();

    let store = controller.store();
    assert_eq!(positions(store, "a"), vec![0, 1]);
    assert_eq!(ids(store, "a"), vec!["a1", "a3"]);
    assert_eq!(positions(store, "b"), vec![0, 1, 2]);
    assert_eq!(ids(store, "b"), vec!["b1", "b2", "a2"]);

    let plan = response.commit.unwrap().plan;
    assert_eq!(
        plan.calls[0],
        SyncCall::AssignColumn {
            card: "a2".into(),
            column: "b".into()
        }
    );
}

#[test]
fn test_column_zero_to_two_on_four_columns() {
    let store = board(&[("c0", &[]), ("c1", &[]), ("c2", &[]), ("c3", &[])]);
    let mut controller = DragController::new(store, DragConfig::default()).unwrap();

    pick_up(&mut controller, DragItem::Column("c0".into()));
    let target = hover_column(controller.store(), "c2");
    controller
        .pointer_move(Point::new(600.0, 10.0), target.clone())
        .unwrap();
    let response = controller.pointer_up(Point::new(600.0, 10.0), target).unwrap();

    let store = controller.store();
    let order: Vec<&str> = store.columns().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(order, vec!["c1", "c2", "c0", "c3"]);
    let positions: Vec<usize> = store.columns().iter().map(|c| c.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);

    let plan = response.commit.unwrap().plan;
    assert_eq!(
        plan.calls,
        vec![SyncCall::ReorderColumns {
            board: "b1".into(),
            ordered_ids: ["c1", "c2", "c0", "c3"]
                .iter()
                .map(|id| ColumnId::from(*id))
                .collect()
        }]
    );
}

#[test]
fn test_move_to_own_position_leaves_positions_unchanged() {
    let store = board(&[("a", &["a1", "a2", "a3"])]);
    let before = store.clone();
    let mut controller = DragController::new(store, DragConfig::default()).unwrap();

    pick_up(&mut controller, DragItem::Card("a2".into()));
    let target = hover_card(controller.store(), "a2");
    controller
        .pointer_move(Point::new(10.0, 50.0), target.clone())
        .unwrap();
    let response = controller.pointer_up(Point::new(10.0, 50.0), target).unwrap();

    assert_eq!(controller.store(), &before);
    assert!(response.commit.unwrap().plan.is_empty());
}

#[test]
fn test_release_over_nothing_restores_exact_order() {
    let store = board(&[("a", &["a1", "a2", "a3"]), ("b", &["b1"])]);
    let before = store.clone();
    let mut controller = DragController::new(store, DragConfig::default()).unwrap();

    pick_up(&mut controller, DragItem::Card("a1".into()));
    // Wander across several targets first
    for (card, y) in [("a3", 95.0), ("b1", 10.0)] {
        let target = hover_card(controller.store(), card);
        let x = target.as_ref().unwrap().bounds.left + 5.0;
        controller.pointer_move(Point::new(x, y), target).unwrap();
    }
    assert_ne!(controller.store(), &before);

    controller
        .pointer_up(Point::new(2000.0, 2000.0), None)
        .unwrap();
    assert_eq!(controller.store(), &before);
}

#[test]
fn test_midpoint_decides_before_or_after() {
    let layout: &[(&str, &[&str])] = &[("a", &["a1"]), ("b", &["b1", "b2"])];

    // Upper half of b1: lands before it
    let mut controller = DragController::new(board(layout), DragConfig::default()).unwrap();
    pick_up(&mut controller, DragItem::Card("a1".into()));
    let target = hover_card(controller.store(), "b1");
    controller
        .pointer_move(Point::new(300.0, 10.0), target)
        .unwrap();
    assert_eq!(ids(controller.store(), "b"), vec!["a1", "b1", "b2"]);

    // Lower half of b1: lands after it
    let mut controller = DragController::new(board(layout), DragConfig::default()).unwrap();
    pick_up(&mut controller, DragItem::Card("a1".into()));
    let target = hover_card(controller.store(), "b1");
    controller
        .pointer_move(Point::new(300.0, 30.0), target)
        .unwrap();
    assert_eq!(ids(controller.store(), "b"), vec!["b1", "a1", "b2"]);
}

#[test]
fn test_drop_into_empty_column() {
    let store = board(&[("a", &["a1", "a2"]), ("empty", &[])]);
    let mut controller = DragController::new(store, DragConfig::default()).unwrap();

    pick_up(&mut controller, DragItem::Card("a1".into()));
    let target = hover_column(controller.store(), "empty");
    let response = controller.pointer_up(Point::new(300.0, 10.0), target).unwrap();

    assert_eq!(ids(controller.store(), "empty"), vec!["a1"]);
    assert_eq!(positions(controller.store(), "empty"), vec![0]);
    assert_eq!(positions(controller.store(), "a"), vec![0]);
    assert!(response.commit.is_some());
}

#[test]
fn test_drop_closes_gaps_left_by_deletion() {
    let store = board(&[("a", &["a1", "a2", "a3", "a4"])]);
    let mut controller = DragController::new(store, DragConfig::default()).unwrap();
    controller.store_mut().remove_card(&CardId::from("a2"));
    assert_eq!(positions(controller.store(), "a"), vec![0, 2, 3]);

    pick_up(&mut controller, DragItem::Card("a4".into()));
    let target = hover_card(controller.store(), "a1");
    controller
        .pointer_move(Point::new(10.0, 5.0), target.clone())
        .unwrap();
    let response = controller.pointer_up(Point::new(10.0, 5.0), target).unwrap();

    assert_eq!(ids(controller.store(), "a"), vec!["a4", "a1", "a3"]);
    assert_eq!(positions(controller.store(), "a"), vec![0, 1, 2]);
    assert!(controller.store().is_dense());

    let plan = response.commit.unwrap().plan;
    assert_eq!(plan.len(), 1);
}

#[test]
fn test_density_after_many_gestures() {
    let store = board(&[
        ("a", &["a1", "a2", "a3"]),
        ("b", &["b1", "b2"]),
        ("c", &[]),
    ]);
    let mut controller = DragController::new(store, DragConfig::default()).unwrap();

    let moves: &[(&str, DropTarget)] = &[
        ("a1", DropTarget::Column("c".into())),
        ("b2", DropTarget::Card("a3".into())),
        ("a1", DropTarget::Card("b1".into())),
        ("a2", DropTarget::Column("b".into())),
    ];
    for (card, target) in moves {
        pick_up(&mut controller, DragItem::Card((*card).into()));
        let bounds = match target {
            DropTarget::Card(id) => card_bounds(controller.store(), id.as_str()),
            DropTarget::Column(id) => column_bounds(controller.store(), id.as_str()),
        };
        let hover = Some(Hover::new(target.clone(), bounds));
        let at = Point::new(bounds.left + 5.0, bounds.top + 5.0);
        let response = controller.pointer_up(at, hover).unwrap();
        let ticket = response.commit.unwrap().ticket;
        controller.resolved(ticket).unwrap();
        assert!(controller.store().is_dense());
    }
    assert_eq!(controller.store().cards().len(), 5);
}
