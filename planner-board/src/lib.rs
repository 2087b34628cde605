//! Drag-and-drop ordering engine for a board of columns and cards
//!
//! This crate holds everything that happens between a pointer press and a
//! finished drop, with no I/O. The async side (server calls, retries,
//! failure notices) lives in `planner-sync`.
//!
//! ## Overview
//!
//! - **Position model** - [`position`] turns ordered sequences into dense
//!   zero-based `position` values and back
//! - **Drag session** - [`drag::DragSession`] is the gesture state machine:
//!   idle, armed, dragging, resolving
//! - **Reorder engine** - [`reorder::apply`] moves the dragged item in the
//!   [`BoardStore`] on every hover change
//! - **Sync plans** - [`plan::derive`] diffs the pre-drag snapshot against the
//!   store and lists the server calls a drop needs
//! - **Controller** - [`DragController`] wires the above together
//!
//! ## Basic Usage
//!
//! ```rust
//! use planner_board::{
//!     BoardStore, Card, Column, DragConfig, DragController, DragItem, DropTarget, Hover,
//!     Point, Rect,
//! };
//!
//! # fn example() -> planner_board::Result<()> {
//! let columns = vec![
//!     Column::new("b1".into(), "Todo", 0).with_id("todo"),
//!     Column::new("b1".into(), "Done", 1).with_id("done"),
//! ];
//! let cards = vec![Card::new("b1".into(), "todo".into(), "Write docs", 0).with_id("c1")];
//! let store = BoardStore::with_contents("b1", columns, cards);
//! let mut controller = DragController::new(store, DragConfig::default())?;
//!
//! let done = Some(Hover::new(
//!     DropTarget::Column("done".into()),
//!     Rect::new(300.0, 0.0, 280.0, 600.0),
//! ));
//! controller.pointer_down(DragItem::Card("c1".into()), Point::new(10.0, 10.0))?;
//! controller.pointer_move(Point::new(320.0, 40.0), done.clone())?;
//! controller.pointer_move(Point::new(330.0, 40.0), done.clone())?;
//! let response = controller.pointer_up(Point::new(330.0, 40.0), done)?;
//!
//! let commit = response.commit.expect("dropped over a target");
//! assert_eq!(commit.plan.len(), 3);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod controller;
pub mod drag;
mod error;
pub mod geometry;
pub mod plan;
pub mod position;
pub mod reorder;
pub mod store;
pub mod timer;
pub mod types;

pub use controller::{DragController, DragResponse, DropCommit};
pub use drag::{
    CancelReason, DragConfig, DragEffect, DragEvent, DragItem, DragKind, DragSession, DragState,
    DragTransition, DropTarget, DropTicket, Hover, NoopReason,
};
pub use error::{BoardError, Result};
pub use geometry::{Point, Rect, DEFAULT_ACTIVATION_DISTANCE};
pub use plan::{SyncCall, SyncKey, SyncPlan};
pub use reorder::Placement;
pub use store::{BoardSnapshot, BoardStore};
pub use timer::{FocusTimer, Phase, Tick, TimerStore};
pub use types::{BoardId, Card, CardId, Column, ColumnId, Positioned};
