//! Persistence for the planner board engine
//!
//! `planner-board` computes the new order of a board while the pointer moves
//! and hands a [`planner_board::SyncPlan`] over when the item is dropped.
//! This crate sends that plan to the board server without ever blocking the
//! gesture.
//!
//! ## Features
//!
//! - **Server contract** - [`BoardApi`], implemented over HTTP by
//!   [`HttpBoardApi`] (retry with exponential backoff) and in memory by
//!   [`MemoryBoardApi`]
//! - **Synchronizer** - one task per call, newer calls for the same container
//!   supersede older ones, failures keep the local order and raise a
//!   [`SyncNotice`]
//! - **Refresh** - [`Planner::refresh`] refetches the board unless a drag or
//!   a call is still in progress
//! - **Configuration** - [`PlannerConfig`] layers defaults, a config file and
//!   `PLANNER_*` environment variables
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use planner_sync::{Planner, PlannerConfig};
//!
//! # async fn example() -> planner_sync::Result<()> {
//! let config = PlannerConfig::load()?;
//! let mut planner = Planner::connect(config).await?;
//! let mut notices = planner.subscribe();
//!
//! // ... feed pointer events to planner.pointer_down / pointer_move / pointer_up ...
//!
//! for report in planner.settle().await? {
//!     println!("drop {} failed calls: {}", report.ticket, report.failed());
//! }
//! while let Ok(notice) = notices.try_recv() {
//!     println!("{notice:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
mod error;
pub mod http;
pub mod memory;
pub mod notice;
pub mod planner;
pub mod synchronizer;

pub use api::{BoardApi, NewCard, NewColumn};
pub use config::{ApiConfig, PlannerConfig, SyncConfig};
pub use error::{Result, SyncError};
pub use http::HttpBoardApi;
pub use memory::MemoryBoardApi;
pub use notice::{NoticeSender, SyncNotice};
pub use planner::{Planner, RefreshOutcome};
pub use synchronizer::{CallOutcome, CallReport, DropHandle, DropReport, Synchronizer};
