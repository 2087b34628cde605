//! Non-blocking failure notices for the UI

use planner_board::{DropTicket, SyncKey};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum SyncNotice {
    /// A server call failed; the local order was kept and `stale` should be
    /// refetched
    CallFailed {
        ticket: DropTicket,
        call: SyncKey,
        stale: SyncKey,
        message: String,
    },
    /// Every call of a drop finished or was superseded
    DropSettled { ticket: DropTicket, failed: usize },
}

/// Broadcasts [`SyncNotice`]s to any number of subscribers
#[derive(Debug, Clone)]
pub struct NoticeSender {
    sender: broadcast::Sender<SyncNotice>,
}

impl NoticeSender {
    /// Create a sender and a first receiver
    pub fn new(buffer_size: usize) -> (Self, broadcast::Receiver<SyncNotice>) {
        let (sender, receiver) = broadcast::channel(buffer_size.max(1));
        (Self { sender }, receiver)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.sender.subscribe()
    }

    /// Send to current subscribers. Having none is not an error.
    pub fn send(&self, notice: SyncNotice) {
        if self.sender.send(notice).is_err() {
            trace!("no notice subscribers");
        }
    }
}
