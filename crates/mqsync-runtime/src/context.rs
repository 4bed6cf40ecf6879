//! Run-scoped state threaded through one pipeline pass.

use mqsync_core::{AggregateResult, Queue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Enumerates supported `PipelineState` values in the order a run reaches them.
pub enum PipelineState {
    Init,
    Authenticated,
    QueueResolved,
    RecordsBuilt,
    Synced,
    Reported,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Authenticated => "authenticated",
            Self::QueueResolved => "queue_resolved",
            Self::RecordsBuilt => "records_built",
            Self::Synced => "synced",
            Self::Reported => "reported",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Messages that never became records, by reason.
pub struct BuildStats {
    pub messages_seen: usize,
    pub without_marker: usize,
    pub repeated_marker: usize,
    pub repeated_marker_skipped: usize,
    pub invalid_payload: usize,
    pub build_skipped: usize,
    pub records_built: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertStats {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Summary returned once a run reaches `Reported`.
pub struct RunReport {
    pub aggregate: AggregateResult,
    pub stats: BuildStats,
    pub alerts: AlertStats,
    pub final_state: PipelineState,
}

#[derive(Debug)]
pub struct RunContext {
    state: PipelineState,
    pub(crate) queue: Option<Queue>,
    pub aggregate: AggregateResult,
    pub stats: BuildStats,
    pub alerts: AlertStats,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Init,
            queue: None,
            aggregate: AggregateResult::default(),
            stats: BuildStats::default(),
            alerts: AlertStats::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn queue(&self) -> Option<&Queue> {
        self.queue.as_ref()
    }

    /// Moves the run forward. States never move backwards.
    pub(crate) fn advance(&mut self, next: PipelineState) {
        if next <= self.state {
            return;
        }
        tracing::debug!(from = self.state.as_str(), to = next.as_str(), "pipeline state");
        self.state = next;
    }

    pub(crate) fn into_report(self) -> RunReport {
        RunReport {
            aggregate: self.aggregate,
            stats: self.stats,
            alerts: self.alerts,
            final_state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineState, RunContext};

    #[test]
    fn unit_run_context_advances_forward_only() {
        let mut context = RunContext::new();
        context.advance(PipelineState::QueueResolved);
        context.advance(PipelineState::Authenticated);
        assert_eq!(context.state(), PipelineState::QueueResolved);
        context.advance(PipelineState::Reported);
        assert_eq!(context.into_report().final_state, PipelineState::Reported);
    }
}
