//! Core types for the board engine

mod board;
mod ids;

pub use board::{Card, Column, Positioned};
pub use ids::{BoardId, CardId, ColumnId};
