//! Execution handles

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use uuid::Uuid;

use super::embedded::EmbeddedSession;
use crate::error::{Error, Result};
use crate::models::{ExecutionResult, ExecutionTier};

/// A monitored execution in flight
///
/// Resolves to exactly one [`ExecutionResult`]. Dropping the handle does not
/// stop the process or the monitor; the result still reaches the sink.
#[derive(Debug)]
pub struct ExecutionHandle {
    id: Uuid,
    tier: ExecutionTier,
    pid: Option<u32>,
    title: String,
    started_at: DateTime<Utc>,
    completion: oneshot::Receiver<ExecutionResult>,
    finished: Option<ExecutionResult>,
    session: Option<EmbeddedSession>,
}

impl ExecutionHandle {
    pub(crate) fn new(
        id: Uuid,
        tier: ExecutionTier,
        pid: Option<u32>,
        title: String,
        started_at: DateTime<Utc>,
        completion: oneshot::Receiver<ExecutionResult>,
        session: Option<EmbeddedSession>,
    ) -> Self {
        Self {
            id,
            tier,
            pid,
            title,
            started_at,
            completion,
            finished: None,
            session,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tier(&self) -> ExecutionTier {
        self.tier
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wait for the process to finish
    pub async fn wait(&mut self) -> ExecutionResult {
        if let Some(result) = &self.finished {
            return result.clone();
        }

        let result = match (&mut self.completion).await {
            Ok(result) => result,
            Err(_) => ExecutionResult::wait_failed(self.title.clone(), "process monitor stopped"),
        };
        self.finished = Some(result.clone());
        result
    }

    /// The result, if the process has already finished
    pub fn try_result(&mut self) -> Option<ExecutionResult> {
        if self.finished.is_none() {
            match self.completion.try_recv() {
                Ok(result) => self.finished = Some(result),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.finished = Some(ExecutionResult::wait_failed(
                        self.title.clone(),
                        "process monitor stopped",
                    ))
                }
            }
        }
        self.finished.clone()
    }

    pub fn session(&self) -> Option<&EmbeddedSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut EmbeddedSession> {
        self.session.as_mut()
    }

    /// Send keyboard input to an embedded execution
    pub fn send_input(&self, data: &[u8]) -> Result<()> {
        match &self.session {
            Some(session) => session.send_input(data),
            None => Err(Error::PtyInputSendFailed {
                reason: format!("'{}' has no embedded terminal", self.title),
            }),
        }
    }

    /// Close the embedded view; the process keeps running and still reports
    pub fn close_view(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.close_view();
        }
    }
}
