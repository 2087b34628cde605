//! BoardStore - the client-held columns and cards of one board
//!
//! The store owns data, not logic: reorder rules live in [`crate::reorder`].
//! Columns are kept in render order. Cards are kept in one flat list and
//! grouped per column on read.

use crate::error::{BoardError, Result};
use crate::position;
use crate::types::{BoardId, Card, CardId, Column, ColumnId};
use tracing::debug;

/// Columns and cards of one board as currently shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct BoardStore {
    board_id: BoardId,
    columns: Vec<Column>,
    cards: Vec<Card>,
}

/// Frozen copy of a store, taken when a drag starts
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    columns: Vec<Column>,
    cards: Vec<Card>,
}

impl BoardSnapshot {
    /// Columns in render order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Cards of one column in render order
    pub fn cards_in(&self, column: &ColumnId) -> Vec<Card> {
        cards_of(&self.cards, column)
    }

    /// Look up a card by id
    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    // Collaborator edits made during a drag are mirrored here so a revert
    // keeps them.

    pub(crate) fn insert_column(&mut self, column: Column) {
        self.columns.retain(|c| c.id != column.id);
        self.columns.push(column);
        self.columns = position::order(&self.columns);
    }

    pub(crate) fn insert_card(&mut self, card: Card) {
        self.cards.retain(|c| c.id != card.id);
        self.cards.push(card);
    }

    pub(crate) fn remove_card(&mut self, id: &CardId) {
        self.cards.retain(|c| &c.id != id);
    }

    pub(crate) fn remove_column(&mut self, id: &ColumnId) {
        self.columns.retain(|c| &c.id != id);
        self.cards.retain(|c| &c.column_id != id);
    }
}

impl BoardStore {
    /// Create an empty store for a board
    pub fn new(board_id: impl Into<BoardId>) -> Self {
        Self {
            board_id: board_id.into(),
            columns: Vec::new(),
            cards: Vec::new(),
        }
    }

    /// Create a store already holding the given contents
    pub fn with_contents(
        board_id: impl Into<BoardId>,
        columns: Vec<Column>,
        cards: Vec<Card>,
    ) -> Self {
        let mut store = Self::new(board_id);
        store.load(columns, cards);
        store
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Columns in render order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// All cards on the board, unordered
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Look up a column by id
    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    /// Look up a card by id
    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    /// Cards of one column in render order
    pub fn cards_in(&self, column: &ColumnId) -> Vec<Card> {
        cards_of(&self.cards, column)
    }

    /// Card ids of one column in render order
    pub fn card_ids_in(&self, column: &ColumnId) -> Vec<CardId> {
        self.cards_in(column).into_iter().map(|c| c.id).collect()
    }

    /// Column ids in render order
    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|c| c.id.clone()).collect()
    }

    /// Whether every container on the board has dense positions
    pub fn is_dense(&self) -> bool {
        position::is_dense(&self.columns)
            && self
                .columns
                .iter()
                .all(|column| position::is_dense(&self.cards_in(&column.id)))
    }

    // =========================================================================
    // Replace
    // =========================================================================

    /// Replace all contents, e.g. after a full fetch.
    ///
    /// Entities belonging to other boards are dropped.
    pub fn load(&mut self, columns: Vec<Column>, cards: Vec<Card>) {
        let columns: Vec<Column> = columns
            .into_iter()
            .filter(|c| c.board_id == self.board_id)
            .collect();
        let cards: Vec<Card> = cards
            .into_iter()
            .filter(|c| c.board_id == self.board_id)
            .collect();

        self.columns = position::order(&columns);
        self.cards = position::order(&cards);
        debug!(
            board = %self.board_id,
            columns = self.columns.len(),
            cards = self.cards.len(),
            "loaded board contents"
        );
    }

    /// Replace the column sequence; the given order becomes the render order
    pub fn replace_columns(&mut self, columns: Vec<Column>) -> Result<()> {
        position::ensure_unique(&columns)?;
        self.columns = columns;
        Ok(())
    }

    /// Overwrite existing cards by id with the given versions
    pub fn write_cards(&mut self, updated: Vec<Card>) -> Result<()> {
        for card in updated {
            let slot = self
                .cards
                .iter_mut()
                .find(|c| c.id == card.id)
                .ok_or_else(|| BoardError::card_not_found(&card.id))?;
            *slot = card;
        }
        Ok(())
    }

    /// Freeze the current contents
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            columns: self.columns.clone(),
            cards: self.cards.clone(),
        }
    }

    /// Put back contents captured by [`BoardStore::snapshot`]
    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        self.columns = snapshot.columns;
        self.cards = snapshot.cards;
    }

    // =========================================================================
    // Create / delete
    // =========================================================================

    /// Append a new column after the current last one
    pub fn add_column(&mut self, title: impl Into<String>) -> Column {
        let column = Column::new(
            self.board_id.clone(),
            title,
            position::next_position(&self.columns),
        );
        self.columns.push(column.clone());
        column
    }

    /// Append a new card at the bottom of a column
    pub fn add_card(&mut self, column: &ColumnId, title: impl Into<String>) -> Result<Card> {
        if self.column(column).is_none() {
            return Err(BoardError::column_not_found(column));
        }
        let position = position::next_position(&self.cards_in(column));
        let card = Card::new(self.board_id.clone(), column.clone(), title, position);
        self.cards.push(card.clone());
        Ok(card)
    }

    /// Insert a column issued elsewhere (e.g. by the server)
    pub fn insert_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.id).is_some() {
            return Err(BoardError::duplicate_id("column", &column.id));
        }
        self.columns.push(column);
        self.columns = position::order(&self.columns);
        Ok(())
    }

    /// Insert a card issued elsewhere (e.g. by the server)
    pub fn insert_card(&mut self, card: Card) -> Result<()> {
        if self.card(&card.id).is_some() {
            return Err(BoardError::duplicate_id("card", &card.id));
        }
        if self.column(&card.column_id).is_none() {
            return Err(BoardError::column_not_found(&card.column_id));
        }
        self.cards.push(card);
        Ok(())
    }

    /// Remove a card. Survivors keep their positions; the gap is closed by
    /// the next reorder of that column.
    pub fn remove_card(&mut self, id: &CardId) -> Option<Card> {
        let index = self.cards.iter().position(|c| &c.id == id)?;
        Some(self.cards.remove(index))
    }

    /// Remove a column together with its cards. Sibling columns keep their
    /// positions.
    pub fn remove_column(&mut self, id: &ColumnId) -> Option<Column> {
        let index = self.columns.iter().position(|c| &c.id == id)?;
        self.cards.retain(|c| &c.column_id != id);
        Some(self.columns.remove(index))
    }
}

fn cards_of(cards: &[Card], column: &ColumnId) -> Vec<Card> {
    let members: Vec<Card> = cards
        .iter()
        .filter(|c| &c.column_id == column)
        .cloned()
        .collect();
    position::order(&members)
}
