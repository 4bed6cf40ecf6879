//! Whole-run deadline and cancellation applied to remote calls.

use std::future::{pending, Future};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::{PipelineStage, RunError};

#[derive(Debug, Clone)]
pub(crate) struct RunGuard {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl RunGuard {
    pub(crate) fn new(run_timeout: Option<Duration>, cancel: Option<watch::Receiver<bool>>) -> Self {
        Self {
            deadline: run_timeout.map(|timeout| Instant::now() + timeout),
            cancel,
        }
    }

    /// Drives `future` unless the run is cancelled or its deadline passes first.
    pub(crate) async fn run<F, T>(&self, stage: PipelineStage, future: F) -> Result<T, RunError>
    where
        F: Future<Output = T>,
    {
        let cancel = self.cancel.clone();
        let cancelled = async move {
            let Some(mut cancel) = cancel else {
                return pending::<()>().await;
            };
            loop {
                if *cancel.borrow_and_update() {
                    return;
                }
                if cancel.changed().await.is_err() {
                    return pending::<()>().await;
                }
            }
        };
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(RunError::Cancelled { stage }),
            _ = expired => Err(RunError::TimedOut { stage }),
            value = future => Ok(value),
        }
    }
}
