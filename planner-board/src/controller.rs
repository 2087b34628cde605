//! DragController - glues the drag session, the reorder engine and the store.
//!
//! The controller is owned by the UI task. Every method runs synchronously
//! and never performs I/O; a finished drop comes back as a [`DropCommit`]
//! carrying the [`SyncPlan`] to persist.

use crate::drag::{
    CancelReason, DragConfig, DragEffect, DragEvent, DragItem, DragSession, DragState,
    DragTransition, DropTarget, DropTicket, Hover,
};
use crate::error::Result;
use crate::geometry::Point;
use crate::plan::{self, SyncPlan};
use crate::reorder::{self, Placement};
use crate::store::{BoardSnapshot, BoardStore};
use crate::types::{Card, CardId, Column, ColumnId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// A drop whose local placement is final and whose persistence is pending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCommit {
    pub ticket: DropTicket,
    pub item: DragItem,
    pub plan: SyncPlan,
}

/// Result of feeding one event to the controller
#[derive(Debug, Clone, PartialEq)]
pub struct DragResponse {
    pub transition: DragTransition,
    /// Set when the store was changed by an over or drop
    pub placement: Option<Placement>,
    /// Set when a drop was committed
    pub commit: Option<DropCommit>,
}

impl DragResponse {
    fn plain(transition: DragTransition) -> Self {
        Self {
            transition,
            placement: None,
            commit: None,
        }
    }

    pub fn effect(&self) -> &DragEffect {
        &self.transition.effect
    }
}

#[derive(Debug, Clone)]
pub struct DragController {
    store: BoardStore,
    session: DragSession,
    /// Taken at drag start, consumed at drop/revert/cancel
    snapshot: Option<BoardSnapshot>,
}

impl DragController {
    pub fn new(store: BoardStore, config: DragConfig) -> Result<Self> {
        Ok(Self {
            store,
            session: DragSession::new(config)?,
            snapshot: None,
        })
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Raw mutable access, e.g. to load a full fetch.
    ///
    /// Edits made here while a drag is in progress are discarded if the drag
    /// is reverted or cancelled. Use the collaborator methods below for
    /// create and delete.
    pub fn store_mut(&mut self) -> &mut BoardStore {
        &mut self.store
    }

    // =========================================================================
    // Collaborator edits
    // =========================================================================

    /// Insert a column created elsewhere. Survives a revert of the active drag.
    pub fn insert_column(&mut self, column: Column) -> Result<()> {
        self.store.insert_column(column.clone())?;
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.insert_column(column);
        }
        Ok(())
    }

    /// Insert a card created elsewhere. Survives a revert of the active drag.
    pub fn insert_card(&mut self, card: Card) -> Result<()> {
        self.store.insert_card(card.clone())?;
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.insert_card(card);
        }
        Ok(())
    }

    /// Remove a card. Removing the dragged card cancels the drag first.
    pub fn remove_card(&mut self, id: &CardId) -> Option<Card> {
        if self.session.state().dragged() == Some(&DragItem::Card(id.clone())) {
            self.unmount();
        }
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.remove_card(id);
        }
        self.store.remove_card(id)
    }

    /// Remove a column and its cards. Removing the dragged column, or the
    /// column the dragged card sits in now or sat in at drag start, cancels
    /// the drag first.
    pub fn remove_column(&mut self, id: &ColumnId) -> Option<Column> {
        let unmounts = match self.session.state().dragged() {
            Some(DragItem::Column(column)) => column == id,
            Some(DragItem::Card(card)) => {
                let now = self.store.card(card).map(|c| &c.column_id);
                let before = self
                    .snapshot
                    .as_ref()
                    .and_then(|s| s.card(card))
                    .map(|c| &c.column_id);
                now == Some(id) || before == Some(id)
            }
            None => false,
        };
        if unmounts {
            self.unmount();
        }
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.remove_column(id);
        }
        self.store.remove_column(id)
    }

    fn unmount(&mut self) {
        if let Some(transition) = self.session.force_cancel(CancelReason::SourceUnmounted) {
            debug!(
                transition = transition.transition_id,
                "dragged item removed, drag cancelled"
            );
            self.revert();
        }
    }

    pub fn state(&self) -> &DragState {
        self.session.state()
    }

    /// Whether a gesture is armed or dragging
    pub fn is_dragging(&self) -> bool {
        self.session.is_active()
    }

    pub fn outstanding(&self) -> Vec<DropTicket> {
        self.session.outstanding().collect()
    }

    pub fn pointer_down(&mut self, item: DragItem, position: Point) -> Result<DragResponse> {
        self.handle(DragEvent::PointerDown { item, position })
    }

    pub fn pointer_move(&mut self, position: Point, hover: Option<Hover>) -> Result<DragResponse> {
        self.handle(DragEvent::PointerMove { position, hover })
    }

    pub fn pointer_up(&mut self, position: Point, hover: Option<Hover>) -> Result<DragResponse> {
        self.handle(DragEvent::PointerUp { position, hover })
    }

    pub fn cancel(&mut self, reason: CancelReason) -> Result<DragResponse> {
        self.handle(DragEvent::Cancel { reason })
    }

    /// Acknowledge that persistence of a drop has finished
    pub fn resolved(&mut self, ticket: DropTicket) -> Result<DragResponse> {
        self.handle(DragEvent::Resolved { ticket })
    }

    /// Feed one event and act on its effect
    pub fn handle(&mut self, event: DragEvent) -> Result<DragResponse> {
        let transition = self.session.apply(event);

        match transition.effect.clone() {
            DragEffect::DragStarted { item } => {
                debug!(item = %item, "drag started");
                self.snapshot = Some(self.store.snapshot());
                Ok(DragResponse::plain(transition))
            }
            DragEffect::Over {
                item,
                target,
                insert_after,
            } => {
                let placement = reorder::apply(&mut self.store, &item, &target, insert_after)
                    .inspect_err(|e| {
                        error!(item = %item, target = %target, error = %e, "over failed")
                    })?;
                Ok(DragResponse {
                    transition,
                    placement: Some(placement),
                    commit: None,
                })
            }
            DragEffect::Dropped {
                item,
                target,
                insert_after,
                retarget,
                ticket,
            } => {
                let snapshot = self.snapshot.take().unwrap_or_else(|| self.store.snapshot());
                let retarget = retarget.then_some((&target, insert_after));
                let committed = self.commit(&snapshot, &item, retarget);
                match committed {
                    Ok((placement, plan)) => {
                        info!(
                            item = %item,
                            target = %target,
                            %ticket,
                            calls = plan.len(),
                            "dropped"
                        );
                        Ok(DragResponse {
                            transition,
                            placement,
                            commit: Some(DropCommit { ticket, item, plan }),
                        })
                    }
                    Err(e) => {
                        error!(
                            item = %item,
                            target = %target,
                            error = %e,
                            "drop failed, reverting"
                        );
                        self.store.restore(snapshot);
                        self.session.apply(DragEvent::Resolved { ticket });
                        Err(e)
                    }
                }
            }
            DragEffect::Reverted { item } => {
                debug!(item = %item, "released over nothing");
                self.revert();
                Ok(DragResponse::plain(transition))
            }
            DragEffect::Cancelled { item, reason } => {
                debug!(item = %item, ?reason, "drag cancelled");
                self.revert();
                Ok(DragResponse::plain(transition))
            }
            DragEffect::Armed { .. }
            | DragEffect::Click { .. }
            | DragEffect::Resolved { .. }
            | DragEffect::Noop { .. } => Ok(DragResponse::plain(transition)),
        }
    }

    fn commit(
        &mut self,
        snapshot: &BoardSnapshot,
        item: &DragItem,
        retarget: Option<(&DropTarget, bool)>,
    ) -> Result<(Option<Placement>, SyncPlan)> {
        let placement = match retarget {
            Some((target, insert_after)) => {
                Some(reorder::apply(&mut self.store, item, target, insert_after)?)
            }
            None => None,
        };
        let plan = plan::derive(snapshot, &self.store, item)?;
        Ok((placement, plan))
    }

    fn revert(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.store.restore(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::NoopReason;
    use crate::geometry::Rect;
    use crate::plan::SyncCall;

    fn controller() -> DragController {
        let columns = vec![
            Column::new("b1".into(), "Todo", 0).with_id("todo"),
            Column::new("b1".into(), "Doing", 1).with_id("doing"),
        ];
        let cards = vec![
            Card::new("b1".into(), "todo".into(), "a", 0).with_id("a"),
            Card::new("b1".into(), "todo".into(), "b", 1).with_id("b"),
            Card::new("b1".into(), "doing".into(), "c", 0).with_id("c"),
        ];
        let store = BoardStore::with_contents("b1", columns, cards);
        DragController::new(store, DragConfig::default()).unwrap()
    }

    fn column_hover(id: &str) -> Option<Hover> {
        Some(Hover::new(
            DropTarget::Column(id.into()),
            Rect::new(300.0, 0.0, 280.0, 800.0),
        ))
    }

    fn start(controller: &mut DragController, item: DragItem) {
        controller.pointer_down(item, Point::new(10.0, 10.0)).unwrap();
        let response = controller.pointer_move(Point::new(10.0, 30.0), None).unwrap();
        assert!(matches!(response.effect(), DragEffect::DragStarted { .. }));
    }

    #[test]
    fn test_drop_commits_plan() {
        let mut controller = controller();
        start(&mut controller, DragItem::Card("a".into()));
        controller
            .pointer_move(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();

        let response = controller
            .pointer_up(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();
        let commit = response.commit.unwrap();
        assert_eq!(commit.plan.len(), 3);
        assert!(matches!(commit.plan.calls[0], SyncCall::AssignColumn { .. }));
        assert_eq!(
            controller.store().card_ids_in(&"doing".into()),
            vec!["c".into(), "a".into()]
        );
        assert_eq!(controller.outstanding(), vec![commit.ticket]);

        controller.resolved(commit.ticket).unwrap();
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_release_over_nothing_restores_snapshot() {
        let mut controller = controller();
        let before = controller.store().clone();
        start(&mut controller, DragItem::Card("a".into()));
        controller
            .pointer_move(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();
        assert_ne!(controller.store(), &before);

        let response = controller.pointer_up(Point::new(900.0, 900.0), None).unwrap();
        assert!(response.commit.is_none());
        assert_eq!(controller.store(), &before);
    }

    #[test]
    fn test_cancel_restores_snapshot() {
        let mut controller = controller();
        let before = controller.store().clone();
        start(&mut controller, DragItem::Column("todo".into()));
        controller
            .pointer_move(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();
        controller.cancel(CancelReason::Escape).unwrap();
        assert_eq!(controller.store(), &before);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_drop_applies_release_target() {
        let mut controller = controller();
        start(&mut controller, DragItem::Card("b".into()));
        let response = controller
            .pointer_up(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();
        assert!(matches!(
            response.placement,
            Some(Placement::CardMoved { .. })
        ));
        assert_eq!(
            controller.store().card(&"b".into()).unwrap().column_id,
            "doing".into()
        );
    }

    #[test]
    fn test_click_leaves_store_alone() {
        let mut controller = controller();
        let before = controller.store().clone();
        controller
            .pointer_down(DragItem::Card("a".into()), Point::new(10.0, 10.0))
            .unwrap();
        let response = controller
            .pointer_up(Point::new(11.0, 11.0), column_hover("doing"))
            .unwrap();
        assert!(matches!(response.effect(), DragEffect::Click { .. }));
        assert_eq!(controller.store(), &before);
    }

    #[test]
    fn test_failed_over_keeps_dragging() {
        let mut controller = controller();
        start(&mut controller, DragItem::Card("a".into()));
        let result = controller.pointer_move(Point::new(400.0, 100.0), column_hover("ghost"));
        assert!(result.is_err());
        assert!(controller.is_dragging());
    }

    #[test]
    fn test_failed_drop_reverts_and_releases_ticket() {
        let mut controller = controller();
        let before = controller.store().clone();
        start(&mut controller, DragItem::Card("a".into()));
        controller
            .pointer_move(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();
        let result = controller.pointer_up(Point::new(400.0, 100.0), column_hover("ghost"));
        assert!(result.is_err());
        assert_eq!(controller.store(), &before);
        assert!(controller.outstanding().is_empty());
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_same_target_is_not_reapplied() {
        let mut controller = controller();
        start(&mut controller, DragItem::Card("b".into()));
        let hover = Some(Hover::new(
            DropTarget::Card("a".into()),
            Rect::new(0.0, 0.0, 280.0, 40.0),
        ));
        controller.pointer_move(Point::new(10.0, 5.0), hover.clone()).unwrap();
        let order = controller.store().card_ids_in(&"todo".into());
        let response = controller.pointer_move(Point::new(12.0, 6.0), hover).unwrap();
        assert_eq!(
            response.effect(),
            &DragEffect::Noop {
                reason: NoopReason::SameTarget
            }
        );
        assert_eq!(controller.store().card_ids_in(&"todo".into()), order);
    }

    #[test]
    fn test_card_created_during_drag_survives_cancel() {
        let mut controller = controller();
        start(&mut controller, DragItem::Card("a".into()));
        controller
            .pointer_move(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();

        let created = Card::new("b1".into(), "todo".into(), "new", 2).with_id("new");
        controller.insert_card(created).unwrap();
        controller.cancel(CancelReason::Escape).unwrap();

        assert_eq!(
            controller.store().card_ids_in(&"todo".into()),
            vec!["a".into(), "b".into(), "new".into()]
        );
        assert_eq!(
            controller.store().card_ids_in(&"doing".into()),
            vec!["c".into()]
        );
    }

    #[test]
    fn test_column_created_during_drag_survives_release_over_nothing() {
        let mut controller = controller();
        start(&mut controller, DragItem::Card("a".into()));

        let created = Column::new("b1".into(), "Later", 2).with_id("later");
        controller.insert_column(created).unwrap();
        controller.pointer_up(Point::new(900.0, 900.0), None).unwrap();

        assert!(controller.store().column(&"later".into()).is_some());
    }

    #[test]
    fn test_card_deleted_during_drag_stays_deleted_after_cancel() {
        let mut controller = controller();
        start(&mut controller, DragItem::Card("a".into()));

        assert!(controller.remove_card(&"b".into()).is_some());
        controller.cancel(CancelReason::Escape).unwrap();

        assert!(controller.store().card(&"b".into()).is_none());
        assert_eq!(
            controller.store().card_ids_in(&"todo".into()),
            vec!["a".into()]
        );
    }

    #[test]
    fn test_deleting_dragged_card_cancels_drag() {
        let mut controller = controller();
        let before = controller.store().clone();
        start(&mut controller, DragItem::Card("a".into()));
        controller
            .pointer_move(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();

        let removed = controller.remove_card(&"a".into()).unwrap();
        assert_eq!(removed.column_id, "todo".into());
        assert_eq!(controller.state(), &DragState::Idle);
        assert!(controller.store().card(&"a".into()).is_none());
        assert_eq!(
            controller.store().card_ids_in(&"doing".into()),
            before.card_ids_in(&"doing".into())
        );
    }

    #[test]
    fn test_deleting_origin_column_of_dragged_card_cancels_drag() {
        let mut controller = controller();
        start(&mut controller, DragItem::Card("a".into()));
        controller
            .pointer_move(Point::new(400.0, 100.0), column_hover("doing"))
            .unwrap();

        controller.remove_column(&"todo".into()).unwrap();
        assert!(!controller.is_dragging());
        assert!(controller.store().card(&"a".into()).is_none());
        assert_eq!(
            controller.store().card_ids_in(&"doing".into()),
            vec!["c".into()]
        );
    }
}
