//! The board server contract

use crate::error::Result;
use async_trait::async_trait;
use planner_board::{BoardId, Card, CardId, Column, ColumnId, SyncCall};
use serde::{Deserialize, Serialize};

/// Body of `PUT /cards/reorder` and `PUT /lists/reorder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedIds<T> {
    pub ordered_ids: Vec<T>,
}

/// Body of `PUT /cards/{id}` when moving a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignColumn {
    #[serde(rename = "listId")]
    pub column_id: ColumnId,
}

/// Body of `POST /lists`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewColumn {
    pub title: String,
    pub board_id: BoardId,
}

/// Body of `POST /cards`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub title: String,
    #[serde(rename = "listId")]
    pub column_id: ColumnId,
    pub board_id: BoardId,
}

/// Server operations used by the board.
///
/// Reorder calls are idempotent: each sets `position = index` for exactly
/// the named ids and leaves everything else alone.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// `PUT /cards/{id}` with `{ listId }`
    async fn assign_column(&self, card: &CardId, column: &ColumnId) -> Result<Card>;

    /// `PUT /cards/reorder`
    async fn reorder_cards(&self, ordered_ids: &[CardId]) -> Result<()>;

    /// `PUT /lists/reorder`
    async fn reorder_columns(&self, ordered_ids: &[ColumnId]) -> Result<()>;

    /// `GET /lists/{boardId}`, sorted by position
    async fn fetch_columns(&self, board: &BoardId) -> Result<Vec<Column>>;

    /// `GET /cards/{boardId}`, sorted by position
    async fn fetch_cards(&self, board: &BoardId) -> Result<Vec<Card>>;

    /// `POST /lists`
    async fn create_column(&self, column: &NewColumn) -> Result<Column>;

    /// `POST /cards`
    async fn create_card(&self, card: &NewCard) -> Result<Card>;

    /// `DELETE /lists/{id}`
    async fn delete_column(&self, column: &ColumnId) -> Result<()>;

    /// `DELETE /cards/{id}`
    async fn delete_card(&self, card: &CardId) -> Result<()>;

    /// Execute one planned call
    async fn execute(&self, call: &SyncCall) -> Result<()> {
        match call {
            SyncCall::AssignColumn { card, column } => {
                self.assign_column(card, column).await?;
            }
            SyncCall::ReorderCards { ordered_ids, .. } => self.reorder_cards(ordered_ids).await?,
            SyncCall::ReorderColumns { ordered_ids, .. } => {
                self.reorder_columns(ordered_ids).await?
            }
        }
        Ok(())
    }
}
