//! Turn deadline
//!
//! One budget per turn, shared by every outbound backend call. A call that
//! loses the race is dropped, which cancels the in-flight request.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{PipelineError, Result, Stage};

#[derive(Debug, Clone, Copy)]
pub struct TurnDeadline {
    started_at: Instant,
    expires_at: Instant,
}

impl TurnDeadline {
    pub fn start(budget: Duration) -> Self {
        let started_at = Instant::now();
        Self {
            started_at,
            expires_at: started_at + budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Run a backend call against whatever is left of the budget
    ///
    /// A spent budget fails immediately without polling `call`.
    pub async fn race<T, F>(&self, stage: Stage, call: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        if self.is_expired() {
            return Err(self.timeout(stage));
        }
        match tokio::time::timeout_at(self.expires_at, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PipelineError::Backend(e)),
            Err(_) => Err(self.timeout(stage)),
        }
    }

    fn timeout(&self, stage: Stage) -> PipelineError {
        PipelineError::Timeout {
            stage,
            after_ms: self.started_at.elapsed().as_millis() as u64,
        }
    }
}
