//! Persistence synchronizer.
//!
//! Turns a committed drop into server calls, one tokio task per call, keyed
//! by the container the call writes. Dispatching a call for a key whose
//! previous task has not finished aborts that task: the newer payload already
//! carries the full order. Each key has a generation counter, and only the
//! task holding the latest generation may report success or failure.
//!
//! Failures never touch the local store. They raise a [`SyncNotice`] and mark
//! the affected container stale until the next full refresh.

use crate::api::BoardApi;
use crate::notice::{NoticeSender, SyncNotice};
use dashmap::{DashMap, DashSet};
use planner_board::{DropCommit, DropTicket, SyncCall, SyncKey};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

/// How one call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum CallOutcome {
    Applied,
    Failed(String),
    /// A newer call for the same container replaced this one
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    pub call: SyncCall,
    pub outcome: CallOutcome,
}

/// Outcome of every call of one drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropReport {
    pub ticket: DropTicket,
    pub calls: Vec<CallReport>,
}

impl DropReport {
    pub fn failed(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c.outcome, CallOutcome::Failed(_)))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

/// Awaitable result of a submitted drop
#[derive(Debug)]
pub struct DropHandle {
    ticket: DropTicket,
    calls: Vec<SyncCall>,
    task: JoinHandle<DropReport>,
}

impl DropHandle {
    pub fn ticket(&self) -> DropTicket {
        self.ticket
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for every call of the drop to finish
    pub async fn wait(self) -> DropReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) => DropReport {
                ticket: self.ticket,
                calls: self
                    .calls
                    .into_iter()
                    .map(|call| CallReport {
                        call,
                        outcome: CallOutcome::Failed(e.to_string()),
                    })
                    .collect(),
            },
        }
    }
}

struct Inner {
    api: Arc<dyn BoardApi>,
    notices: NoticeSender,
    next_generation: AtomicU64,
    /// Latest generation dispatched per key
    generations: DashMap<SyncKey, u64>,
    /// Abort handle of the latest task per key
    tasks: DashMap<SyncKey, (u64, AbortHandle)>,
    stale: DashSet<SyncKey>,
    in_flight: watch::Sender<usize>,
}

impl Inner {
    fn is_latest(&self, key: &SyncKey, generation: u64) -> bool {
        self.generations.get(key).map(|g| *g) == Some(generation)
    }
}

/// Decrements the in-flight count when a call task ends or is aborted
struct InFlight(Arc<Inner>);

impl InFlight {
    fn enter(inner: Arc<Inner>) -> Self {
        inner.in_flight.send_modify(|n| *n += 1);
        Self(inner)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[derive(Clone)]
pub struct Synchronizer {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("in_flight", &self.in_flight())
            .field("stale", &self.stale())
            .finish()
    }
}

impl Synchronizer {
    pub fn new(
        api: Arc<dyn BoardApi>,
        notice_buffer: usize,
    ) -> (Self, broadcast::Receiver<SyncNotice>) {
        let (notices, receiver) = NoticeSender::new(notice_buffer);
        let (in_flight, _) = watch::channel(0);
        let inner = Inner {
            api,
            notices,
            next_generation: AtomicU64::new(1),
            generations: DashMap::new(),
            tasks: DashMap::new(),
            stale: DashSet::new(),
            in_flight,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    pub fn api(&self) -> &Arc<dyn BoardApi> {
        &self.inner.api
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.inner.notices.subscribe()
    }

    /// Number of call tasks not yet finished
    pub fn in_flight(&self) -> usize {
        *self.inner.in_flight.borrow()
    }

    /// Wait until no call task is running
    pub async fn wait_idle(&self) {
        let mut receiver = self.inner.in_flight.subscribe();
        if receiver.wait_for(|n| *n == 0).await.is_err() {
            warn!("in-flight counter closed");
        }
    }

    /// Containers whose server copy may disagree with the local order
    pub fn stale(&self) -> Vec<SyncKey> {
        let mut keys: Vec<SyncKey> = self.inner.stale.iter().map(|k| k.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn is_stale(&self, key: &SyncKey) -> bool {
        self.inner.stale.contains(key)
    }

    pub fn clear_stale(&self) {
        self.inner.stale.clear();
    }

    /// Dispatch every call of a committed drop. Must run inside a tokio
    /// runtime; nothing here waits on the network.
    pub fn submit(&self, commit: DropCommit) -> DropHandle {
        let DropCommit { ticket, item, plan } = commit;
        info!(%ticket, item = %item, calls = plan.len(), "submitting drop");

        let calls: Vec<SyncCall> = plan.into_iter().collect();
        let handles: Vec<(SyncCall, JoinHandle<CallOutcome>)> = calls
            .iter()
            .cloned()
            .map(|call| {
                let handle = self.dispatch(ticket, call.clone());
                (call, handle)
            })
            .collect();

        let notices = self.inner.notices.clone();
        let task = tokio::spawn(async move {
            let mut reports = Vec::with_capacity(handles.len());
            for (call, handle) in handles {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_cancelled() => CallOutcome::Superseded,
                    Err(e) => CallOutcome::Failed(e.to_string()),
                };
                reports.push(CallReport { call, outcome });
            }
            let report = DropReport {
                ticket,
                calls: reports,
            };
            notices.send(SyncNotice::DropSettled {
                ticket,
                failed: report.failed(),
            });
            report
        });

        DropHandle {
            ticket,
            calls,
            task,
        }
    }

    fn dispatch(&self, ticket: DropTicket, call: SyncCall) -> JoinHandle<CallOutcome> {
        let key = call.key();
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        self.inner.generations.insert(key.clone(), generation);

        let guard = InFlight::enter(Arc::clone(&self.inner));
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let result = inner.api.execute(&call).await;

            if !inner.is_latest(&task_key, generation) {
                debug!(key = %task_key, generation, "finished after being superseded");
                return CallOutcome::Superseded;
            }
            inner
                .tasks
                .remove_if(&task_key, |_, (g, _)| *g == generation);
            inner
                .generations
                .remove_if(&task_key, |_, g| *g == generation);

            match result {
                Ok(()) => {
                    debug!(key = %task_key, generation, "call applied");
                    CallOutcome::Applied
                }
                Err(e) => {
                    let stale = call.stale_container();
                    warn!(
                        key = %task_key,
                        stale = %stale,
                        error = %e,
                        "call failed, keeping local order"
                    );
                    inner.stale.insert(stale.clone());
                    inner.notices.send(SyncNotice::CallFailed {
                        ticket,
                        call: task_key,
                        stale,
                        message: e.to_string(),
                    });
                    CallOutcome::Failed(e.to_string())
                }
            }
        });

        let previous = self
            .inner
            .tasks
            .insert(key.clone(), (generation, handle.abort_handle()));
        if let Some((old_generation, old)) = previous {
            if !old.is_finished() {
                debug!(key = %key, old_generation, generation, "superseding call");
                old.abort();
            }
        }
        handle
    }
}
