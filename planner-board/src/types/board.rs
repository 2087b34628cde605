//! Board-level entities: Column and Card

use super::ids::{BoardId, CardId, ColumnId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::Hash;

/// An entity that occupies a slot in an ordered container.
///
/// Columns are ordered within their board, cards within their column.
pub trait Positioned: Clone {
    /// The id type of the entity
    type Id: Clone + Eq + Hash + Display;

    /// Human-readable entity kind used in error messages
    const KIND: &'static str;

    /// Entity id
    fn id(&self) -> &Self::Id;

    /// Persisted index within the container
    fn position(&self) -> usize;

    /// Overwrite the persisted index
    fn set_position(&mut self, position: usize);
}

/// A column (list) on a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(rename = "_id", alias = "id")]
    pub id: ColumnId,
    pub title: String,
    pub board_id: BoardId,
    #[serde(default)]
    pub position: usize,
}

impl Column {
    /// Create a new column with a fresh id
    pub fn new(board_id: BoardId, title: impl Into<String>, position: usize) -> Self {
        Self {
            id: ColumnId::new(),
            title: title.into(),
            board_id,
            position,
        }
    }

    /// Replace the id (used when the server issued one)
    pub fn with_id(mut self, id: impl Into<ColumnId>) -> Self {
        self.id = id.into();
        self
    }
}

impl Positioned for Column {
    type Id = ColumnId;
    const KIND: &'static str = "column";

    fn id(&self) -> &ColumnId {
        &self.id
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// A card inside a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "_id", alias = "id")]
    pub id: CardId,
    pub title: String,
    /// Owning column
    #[serde(rename = "listId")]
    pub column_id: ColumnId,
    /// Owning board, denormalized for fast filtering
    pub board_id: BoardId,
    #[serde(default)]
    pub position: usize,
}

impl Card {
    /// Create a new card with a fresh id
    pub fn new(
        board_id: BoardId,
        column_id: ColumnId,
        title: impl Into<String>,
        position: usize,
    ) -> Self {
        Self {
            id: CardId::new(),
            title: title.into(),
            column_id,
            board_id,
            position,
        }
    }

    /// Replace the id (used when the server issued one)
    pub fn with_id(mut self, id: impl Into<CardId>) -> Self {
        self.id = id.into();
        self
    }
}

impl Positioned for Card {
    type Id = CardId;
    const KIND: &'static str = "card";

    fn id(&self) -> &CardId {
        &self.id
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_wire_format() {
        let card = Card::new("b1".into(), "l1".into(), "Write docs", 2).with_id("c1");
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["_id"], "c1");
        assert_eq!(json["listId"], "l1");
        assert_eq!(json["boardId"], "b1");
        assert_eq!(json["position"], 2);
    }

    #[test]
    fn test_card_reads_server_payload() {
        // Server responses carry extra fields that the engine does not care about
        let json = r#"{
            "_id": "c9",
            "title": "Ship it",
            "listId": "l2",
            "boardId": "b1",
            "position": 4,
            "completed": false,
            "labels": [{"color": "red"}]
        }"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.id.as_str(), "c9");
        assert_eq!(card.column_id.as_str(), "l2");
        assert_eq!(card.position, 4);
    }

    #[test]
    fn test_column_accepts_plain_id_and_missing_position() {
        let json = r#"{"id": "l1", "title": "Todo", "boardId": "b1"}"#;
        let column: Column = serde_json::from_str(json).unwrap();
        assert_eq!(column.id.as_str(), "l1");
        assert_eq!(column.position, 0);
    }
}
