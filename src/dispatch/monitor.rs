//! Process Monitor
//!
//! Tracks each spawned process from launch to exit and delivers exactly one
//! [`ExecutionResult`] per execution, both to the handle's completion future
//! and to the dispatcher's [`ResultSink`].
//!
//! Entries live in a registry keyed by execution id. A stale or unknown id is
//! ignored, so a late or duplicated exit notification can never produce a
//! second result.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{oneshot, RwLock};
use uuid::Uuid;

use super::embedded::EmbeddedSession;
use super::handle::ExecutionHandle;
use crate::models::{ExecutionResult, ExecutionTier, MonitorState};
use crate::pty::ProcessWaiter;

/// Receives every final execution result
pub trait ResultSink: Send + Sync {
    fn report(&self, result: ExecutionResult);
}

impl<F> ResultSink for F
where
    F: Fn(ExecutionResult) + Send + Sync,
{
    fn report(&self, result: ExecutionResult) {
        self(result)
    }
}

/// Sink forwarding results over a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<ExecutionResult>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<ExecutionResult>) -> Self {
        Self { tx }
    }
}

impl From<UnboundedSender<ExecutionResult>> for ChannelSink {
    fn from(tx: UnboundedSender<ExecutionResult>) -> Self {
        Self::new(tx)
    }
}

impl ResultSink for ChannelSink {
    fn report(&self, result: ExecutionResult) {
        if self.tx.send(result).is_err() {
            debug!("Result receiver dropped, discarding execution result");
        }
    }
}

/// Sink that only logs results
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn report(&self, result: ExecutionResult) {
        if result.is_success() {
            info!("{}", result);
        } else {
            warn!("{}", result);
        }
    }
}

/// Proof that a spawn was announced to the monitor
///
/// Consumed by exactly one of [`ProcessMonitor::running`] or
/// [`ProcessMonitor::launch_failed`].
#[derive(Debug)]
pub struct WatchTicket {
    id: Uuid,
    title: String,
    tier: ExecutionTier,
    completion: oneshot::Receiver<ExecutionResult>,
}

impl WatchTicket {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// A single monitored execution
struct WatchEntry {
    title: String,
    state: MonitorState,
    pid: Option<u32>,
    started_at: DateTime<Utc>,
    completion: Option<oneshot::Sender<ExecutionResult>>,
}

/// Snapshot of a monitored execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchInfo {
    pub id: Uuid,
    pub title: String,
    pub state: MonitorState,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
}

/// Tracks spawned processes and reports their outcome once
#[derive(Clone)]
pub struct ProcessMonitor {
    entries: Arc<RwLock<HashMap<Uuid, WatchEntry>>>,
    sink: Arc<dyn ResultSink>,
}

impl ProcessMonitor {
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            sink,
        }
    }

    /// Announce a spawn attempt
    pub async fn begin(&self, title: &str, tier: ExecutionTier) -> WatchTicket {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        self.entries.write().await.insert(
            id,
            WatchEntry {
                title: title.to_string(),
                state: MonitorState::Spawning,
                pid: None,
                started_at: Utc::now(),
                completion: Some(tx),
            },
        );
        debug!("Monitoring '{}' ({}, id: {})", title, tier, id);

        WatchTicket {
            id,
            title: title.to_string(),
            tier,
            completion: rx,
        }
    }

    /// The spawn failed; deliver `{title, None, reason}`
    pub async fn launch_failed(&self, ticket: WatchTicket, reason: &str) -> ExecutionResult {
        let result = ExecutionResult::launch_failed(ticket.title.clone(), reason);
        self.finish(ticket.id, MonitorState::LaunchFailed, |_| result.clone())
            .await;
        result
    }

    /// The spawn succeeded; the returned handle resolves when the process exits
    pub async fn running(
        &self,
        ticket: WatchTicket,
        pid: Option<u32>,
        session: Option<EmbeddedSession>,
    ) -> ExecutionHandle {
        let started_at = {
            let mut entries = self.entries.write().await;
            match entries.get_mut(&ticket.id) {
                Some(entry) if entry.state.can_transition_to(MonitorState::Running) => {
                    entry.state = MonitorState::Running;
                    entry.pid = pid;
                    entry.started_at
                }
                _ => Utc::now(),
            }
        };
        debug!("'{}' running (pid: {:?})", ticket.title, pid);

        ExecutionHandle::new(
            ticket.id,
            ticket.tier,
            pid,
            ticket.title,
            started_at,
            ticket.completion,
            session,
        )
    }

    /// Record the exit of a running process
    ///
    /// Returns `false` for unknown, stale or already finished ids.
    pub async fn exited(&self, id: Uuid, code: i32) -> bool {
        self.finish(id, MonitorState::Exited, |title| {
            ExecutionResult::exited(title, code)
        })
        .await
    }

    /// The exit status of a running process could not be collected
    pub async fn wait_failed(&self, id: Uuid, reason: &str) -> bool {
        self.finish(id, MonitorState::Exited, |title| {
            ExecutionResult::wait_failed(title, reason)
        })
        .await
    }

    /// Wait for `waiter` on a blocking worker and record the exit
    pub fn watch(&self, id: Uuid, waiter: Box<dyn ProcessWaiter>) {
        let monitor = self.clone();
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(move || waiter.wait()).await {
                Ok(Ok(code)) => {
                    monitor.exited(id, code).await;
                }
                Ok(Err(e)) => {
                    monitor.wait_failed(id, &e.to_string()).await;
                }
                Err(e) => {
                    monitor
                        .wait_failed(id, &format!("exit waiter panicked: {}", e))
                        .await;
                }
            }
        });
    }

    /// State of an in-flight execution; `None` once it has finished
    pub async fn state(&self, id: Uuid) -> Option<MonitorState> {
        self.entries.read().await.get(&id).map(|entry| entry.state)
    }

    pub async fn info(&self, id: Uuid) -> Option<WatchInfo> {
        self.entries.read().await.get(&id).map(|entry| WatchInfo {
            id,
            title: entry.title.clone(),
            state: entry.state,
            pid: entry.pid,
            started_at: entry.started_at,
        })
    }

    /// Number of executions that have not delivered a result yet
    pub async fn active_count(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn finish<F>(&self, id: Uuid, next: MonitorState, build: F) -> bool
    where
        F: FnOnce(String) -> ExecutionResult,
    {
        let entry = {
            let mut entries = self.entries.write().await;
            match entries.get(&id) {
                Some(entry) if entry.state.can_transition_to(next) => entries.remove(&id),
                Some(entry) => {
                    debug!(
                        "Ignoring {:?} for '{}' in state {:?}",
                        next, entry.title, entry.state
                    );
                    None
                }
                None => {
                    debug!("Ignoring {:?} for unknown execution {}", next, id);
                    None
                }
            }
        };

        let Some(mut entry) = entry else {
            return false;
        };

        let result = build(entry.title.clone());
        match next {
            MonitorState::LaunchFailed => error!("{}", result),
            _ => info!("{}", result),
        }

        if let Some(tx) = entry.completion.take() {
            let _ = tx.send(result.clone());
        }
        self.sink.report(result);
        true
    }
}
