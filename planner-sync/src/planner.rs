//! The planner facade: one drag controller, one synchronizer, one timer store.
//!
//! Gestures are synchronous and never wait on the network. A drop submits its
//! plan to the [`Synchronizer`] and the handle is kept until the drop settles;
//! [`Planner::settle`] and [`Planner::collect_settled`] acknowledge settled
//! tickets back to the drag controller.

use crate::api::{BoardApi, NewCard, NewColumn};
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::http::HttpBoardApi;
use crate::notice::SyncNotice;
use crate::synchronizer::{DropHandle, DropReport, Synchronizer};
use planner_board::{
    BoardError, BoardId, BoardStore, CancelReason, Card, CardId, Column, ColumnId, DragController,
    DragItem, DragResponse, DropTicket, Hover, Point, TimerStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Result of [`Planner::refresh`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Applied { columns: usize, cards: usize },
    /// Local state is newer than anything the server could return right now
    Deferred { dragging: bool, in_flight: usize },
}

pub struct Planner {
    config: PlannerConfig,
    controller: DragController,
    synchronizer: Synchronizer,
    pending: Vec<DropHandle>,
    timers: TimerStore,
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("board", self.controller.store().board_id())
            .field("state", self.controller.state())
            .field("pending", &self.pending.len())
            .field("synchronizer", &self.synchronizer)
            .finish()
    }
}

impl Planner {
    /// Create a planner with an empty board. Call [`Planner::refresh`] to
    /// load it.
    pub fn new(config: PlannerConfig, api: Arc<dyn BoardApi>, board: BoardId) -> Result<Self> {
        config.validate()?;
        let controller = DragController::new(BoardStore::new(board), config.drag)?;
        let (synchronizer, _) = Synchronizer::new(api, config.sync.notice_buffer);
        Ok(Self {
            config,
            controller,
            synchronizer,
            pending: Vec::new(),
            timers: TimerStore::new(),
        })
    }

    /// Create a planner and load the board from the server
    pub async fn open(
        config: PlannerConfig,
        api: Arc<dyn BoardApi>,
        board: BoardId,
    ) -> Result<Self> {
        let mut planner = Self::new(config, api, board)?;
        planner.refresh().await?;
        Ok(planner)
    }

    /// Open the configured board over HTTP
    pub async fn connect(config: PlannerConfig) -> Result<Self> {
        let board = config.api.board_id().ok_or_else(|| {
            BoardError::invalid_config("api.board_id", "a board id is required to connect")
        })?;
        let api = Arc::new(HttpBoardApi::new(&config.api)?);
        Self::open(config, api, board).await
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn store(&self) -> &BoardStore {
        self.controller.store()
    }

    pub fn controller(&self) -> &DragController {
        &self.controller
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.synchronizer
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.synchronizer.subscribe()
    }

    pub fn timers(&self) -> &TimerStore {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerStore {
        &mut self.timers
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    pub fn pointer_down(&mut self, item: DragItem, position: Point) -> Result<DragResponse> {
        Ok(self.controller.pointer_down(item, position)?)
    }

    pub fn pointer_move(&mut self, position: Point, hover: Option<Hover>) -> Result<DragResponse> {
        Ok(self.controller.pointer_move(position, hover)?)
    }

    /// Release the pointer. A committed drop is handed to the synchronizer
    /// and runs in the background.
    pub fn pointer_up(&mut self, position: Point, hover: Option<Hover>) -> Result<DragResponse> {
        let response = self.controller.pointer_up(position, hover)?;
        if let Some(commit) = &response.commit {
            if commit.plan.is_empty() {
                self.controller.resolved(commit.ticket)?;
            } else {
                let handle = self.synchronizer.submit(commit.clone());
                self.pending.push(handle);
            }
        }
        Ok(response)
    }

    pub fn cancel(&mut self, reason: CancelReason) -> Result<DragResponse> {
        Ok(self.controller.cancel(reason)?)
    }

    /// Mark a drop as persisted
    pub fn acknowledge(&mut self, ticket: DropTicket) -> Result<DragResponse> {
        Ok(self.controller.resolved(ticket)?)
    }

    /// Drops handed to the synchronizer and not yet acknowledged
    pub fn pending(&self) -> Vec<DropTicket> {
        self.pending.iter().map(DropHandle::ticket).collect()
    }

    /// Wait for every pending drop and acknowledge it
    pub async fn settle(&mut self) -> Result<Vec<DropReport>> {
        let handles = std::mem::take(&mut self.pending);
        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            let report = handle.wait().await;
            self.acknowledge(report.ticket)?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Acknowledge drops that have already settled, without waiting
    pub async fn collect_settled(&mut self) -> Result<Vec<DropReport>> {
        let (finished, running): (Vec<DropHandle>, Vec<DropHandle>) =
            std::mem::take(&mut self.pending)
                .into_iter()
                .partition(DropHandle::is_finished);
        self.pending = running;

        let mut reports = Vec::with_capacity(finished.len());
        for handle in finished {
            let report = handle.wait().await;
            self.acknowledge(report.ticket)?;
            reports.push(report);
        }
        Ok(reports)
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Replace the local board with a full fetch, unless a drag is active or
    /// calls are still in flight. Clears stale marks when applied.
    pub async fn refresh(&mut self) -> Result<RefreshOutcome> {
        if let Some(deferred) = self.deferral() {
            warn!(?deferred, "refresh deferred");
            return Ok(deferred);
        }

        let board = self.controller.store().board_id().clone();
        let api = self.synchronizer.api();
        let columns = api.fetch_columns(&board).await?;
        let cards = api.fetch_cards(&board).await?;

        if let Some(deferred) = self.deferral() {
            warn!(?deferred, "refresh deferred after fetch");
            return Ok(deferred);
        }

        let outcome = RefreshOutcome::Applied {
            columns: columns.len(),
            cards: cards.len(),
        };
        self.controller.store_mut().load(columns, cards);
        self.synchronizer.clear_stale();
        info!(board = %board, ?outcome, "board refreshed");
        Ok(outcome)
    }

    fn deferral(&self) -> Option<RefreshOutcome> {
        let dragging = self.controller.is_dragging();
        let in_flight = self.synchronizer.in_flight();
        (dragging || in_flight > 0).then_some(RefreshOutcome::Deferred {
            dragging,
            in_flight,
        })
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    pub async fn create_column(&mut self, title: impl Into<String>) -> Result<Column> {
        let request = NewColumn {
            title: title.into(),
            board_id: self.controller.store().board_id().clone(),
        };
        let column = self.synchronizer.api().create_column(&request).await?;
        self.controller.insert_column(column.clone())?;
        info!(column = %column.id, "column created");
        Ok(column)
    }

    pub async fn create_card(
        &mut self,
        column: &ColumnId,
        title: impl Into<String>,
    ) -> Result<Card> {
        if self.controller.store().column(column).is_none() {
            return Err(BoardError::column_not_found(column).into());
        }
        let request = NewCard {
            title: title.into(),
            column_id: column.clone(),
            board_id: self.controller.store().board_id().clone(),
        };
        let card = self.synchronizer.api().create_card(&request).await?;
        self.controller.insert_card(card.clone())?;
        info!(card = %card.id, column = %column, "card created");
        Ok(card)
    }

    pub async fn delete_column(&mut self, column: &ColumnId) -> Result<Column> {
        if self.controller.store().column(column).is_none() {
            return Err(BoardError::column_not_found(column).into());
        }
        self.synchronizer.api().delete_column(column).await?;
        let removed = self
            .controller
            .remove_column(column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let orphaned = self
            .timers
            .get()
            .is_some_and(|t| self.controller.store().card(&t.active_card).is_none());
        if orphaned {
            self.timers.close();
        }
        info!(column = %column, "column deleted");
        Ok(removed)
    }

    pub async fn delete_card(&mut self, card: &CardId) -> Result<Card> {
        if self.controller.store().card(card).is_none() {
            return Err(BoardError::card_not_found(card).into());
        }
        self.synchronizer.api().delete_card(card).await?;
        let removed = self
            .controller
            .remove_card(card)
            .ok_or_else(|| BoardError::card_not_found(card))?;
        if self.timers.get().is_some_and(|t| &t.active_card == card) {
            self.timers.close();
        }
        info!(card = %card, "card deleted");
        Ok(removed)
    }
}
