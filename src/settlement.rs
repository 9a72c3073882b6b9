//! Outcome settlement
//!
//! The engine knows nothing about stakes or payouts. It hands the terminal
//! report to a `Settlement` implementation and moves on. A submission that
//! fails, immediately or later through `poll_failures`, is queued by the
//! controller until the caller retries it.

use crate::error::SettlementError;
use crate::round::OutcomeReport;

/// External collaborator that settles a finished round
pub trait Settlement {
    /// Deliver the report. Must not block the frame loop; asynchronous
    /// implementations return `Ok` once the request is dispatched.
    fn submit(&mut self, report: &OutcomeReport) -> Result<(), SettlementError>;

    /// Reports accepted by `submit` whose delivery failed afterwards
    fn poll_failures(&mut self) -> Vec<OutcomeReport> {
        Vec::new()
    }
}

/// Settlement that only logs the report (native builds, tests)
#[derive(Debug, Clone, Default)]
pub struct LogSettlement {
    submitted: Vec<OutcomeReport>,
}

impl LogSettlement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> &[OutcomeReport] {
        &self.submitted
    }
}

impl Settlement for LogSettlement {
    fn submit(&mut self, report: &OutcomeReport) -> Result<(), SettlementError> {
        log::info!(
            "Round settled: {} after {} ticks (replay {})",
            report.outcome.as_str(),
            report.ticks_elapsed,
            report.replay_digest
        );
        self.submitted.push(report.clone());
        Ok(())
    }
}
