//! In-memory board server.
//!
//! Behaves like the HTTP server: create appends at `max + 1`, delete leaves
//! gaps, reorder writes `position = index` for the named ids only, fetches
//! come back sorted. Latency and failures can be injected for tests and
//! offline use.

use crate::api::{BoardApi, NewCard, NewColumn};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use planner_board::position::{next_position, order};
use planner_board::{BoardId, Card, CardId, Column, ColumnId};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Records {
    columns: Vec<Column>,
    cards: Vec<Card>,
}

#[derive(Debug, Default)]
pub struct MemoryBoardApi {
    records: RwLock<Records>,
    offline: AtomicBool,
    fail_next: AtomicU32,
    latency_ms: AtomicU64,
    requests: AtomicU64,
}

impl MemoryBoardApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(columns: Vec<Column>, cards: Vec<Card>) -> Self {
        Self {
            records: RwLock::new(Records { columns, cards }),
            ..Self::default()
        }
    }

    /// Fail every call until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail the next `n` calls
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Delay every call
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of calls received, including failed ones
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Cards of one column as stored, sorted by position
    pub async fn stored_cards(&self, column: &ColumnId) -> Vec<Card> {
        let records = self.records.read().await;
        let members: Vec<Card> = records
            .cards
            .iter()
            .filter(|c| &c.column_id == column)
            .cloned()
            .collect();
        order(&members)
    }

    async fn gate(&self, operation: &str) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable(format!("{operation}: offline")));
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            return Err(SyncError::Unavailable(format!("{operation}: injected failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl BoardApi for MemoryBoardApi {
    async fn assign_column(&self, card: &CardId, column: &ColumnId) -> Result<Card> {
        self.gate("assign_column").await?;
        let mut records = self.records.write().await;
        if !records.columns.iter().any(|c| &c.id == column) {
            return Err(SyncError::not_found("column", column));
        }
        let stored = records
            .cards
            .iter_mut()
            .find(|c| &c.id == card)
            .ok_or_else(|| SyncError::not_found("card", card))?;
        stored.column_id = column.clone();
        Ok(stored.clone())
    }

    async fn reorder_cards(&self, ordered_ids: &[CardId]) -> Result<()> {
        self.gate("reorder_cards").await?;
        let mut records = self.records.write().await;
        for (index, id) in ordered_ids.iter().enumerate() {
            // Unknown ids are skipped, like an update matching no document
            if let Some(card) = records.cards.iter_mut().find(|c| &c.id == id) {
                card.position = index;
            }
        }
        debug!(count = ordered_ids.len(), "memory: cards reordered");
        Ok(())
    }

    async fn reorder_columns(&self, ordered_ids: &[ColumnId]) -> Result<()> {
        self.gate("reorder_columns").await?;
        let mut records = self.records.write().await;
        for (index, id) in ordered_ids.iter().enumerate() {
            if let Some(column) = records.columns.iter_mut().find(|c| &c.id == id) {
                column.position = index;
            }
        }
        Ok(())
    }

    async fn fetch_columns(&self, board: &BoardId) -> Result<Vec<Column>> {
        self.gate("fetch_columns").await?;
        let records = self.records.read().await;
        let columns: Vec<Column> = records
            .columns
            .iter()
            .filter(|c| &c.board_id == board)
            .cloned()
            .collect();
        Ok(order(&columns))
    }

    async fn fetch_cards(&self, board: &BoardId) -> Result<Vec<Card>> {
        self.gate("fetch_cards").await?;
        let records = self.records.read().await;
        let cards: Vec<Card> = records
            .cards
            .iter()
            .filter(|c| &c.board_id == board)
            .cloned()
            .collect();
        Ok(order(&cards))
    }

    async fn create_column(&self, column: &NewColumn) -> Result<Column> {
        self.gate("create_column").await?;
        let mut records = self.records.write().await;
        let siblings: Vec<Column> = records
            .columns
            .iter()
            .filter(|c| c.board_id == column.board_id)
            .cloned()
            .collect();
        let created = Column::new(
            column.board_id.clone(),
            column.title.clone(),
            next_position(&siblings),
        );
        records.columns.push(created.clone());
        Ok(created)
    }

    async fn create_card(&self, card: &NewCard) -> Result<Card> {
        self.gate("create_card").await?;
        let mut records = self.records.write().await;
        if !records.columns.iter().any(|c| c.id == card.column_id) {
            return Err(SyncError::not_found("column", &card.column_id));
        }
        let siblings: Vec<Card> = records
            .cards
            .iter()
            .filter(|c| c.column_id == card.column_id)
            .cloned()
            .collect();
        let created = Card::new(
            card.board_id.clone(),
            card.column_id.clone(),
            card.title.clone(),
            next_position(&siblings),
        );
        records.cards.push(created.clone());
        Ok(created)
    }

    async fn delete_column(&self, column: &ColumnId) -> Result<()> {
        self.gate("delete_column").await?;
        let mut records = self.records.write().await;
        let before = records.columns.len();
        records.columns.retain(|c| &c.id != column);
        if records.columns.len() == before {
            return Err(SyncError::not_found("column", column));
        }
        records.cards.retain(|c| &c.column_id != column);
        Ok(())
    }

    async fn delete_card(&self, card: &CardId) -> Result<()> {
        self.gate("delete_card").await?;
        let mut records = self.records.write().await;
        let before = records.cards.len();
        records.cards.retain(|c| &c.id != card);
        if records.cards.len() == before {
            return Err(SyncError::not_found("card", card));
        }
        Ok(())
    }
}
