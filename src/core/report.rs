use crate::core::resolver::ClearReason;
use crate::domain::model::{ConnectionStatus, EndpointKind, Termination, TerminationId};
use crate::utils::error::CableTraceError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A termination whose reconciliation was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFailure {
    pub termination: TerminationId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Real endpoints touched by the cable change.
    pub endpoints: usize,
    /// Caches whose stored value changed.
    pub written: usize,
    pub failures: Vec<TraceFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub kind: EndpointKind,
    pub processed: usize,
    pub updated: usize,
    pub failed: usize,
}

impl ModelSummary {
    pub fn new(kind: EndpointKind) -> Self {
        Self {
            kind,
            processed: 0,
            updated: 0,
            failed: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub models: Vec<ModelSummary>,
    pub cancelled: bool,
}

impl RebuildSummary {
    pub fn total_processed(&self) -> usize {
        self.models.iter().map(|m| m.processed).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.models.iter().map(|m| m.updated).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.models.iter().map(|m| m.failed).sum()
    }

    pub fn model(&self, kind: EndpointKind) -> Option<&ModelSummary> {
        self.models.iter().find(|m| m.kind == kind)
    }
}

/// Receives the engine's decisions. Every method defaults to doing nothing.
pub trait Reporter {
    fn retrace_started(&mut self, _kinds: &[EndpointKind]) {}

    fn model_started(&mut self, _kind: EndpointKind, _endpoints: usize) {}

    fn endpoints_connected(&mut self, _a: &Termination, _b: &Termination, _status: ConnectionStatus) {}

    fn endpoint_cleared(&mut self, _a: &Termination, _reason: ClearReason) {}

    fn trace_failed(&mut self, _termination: &Termination, _error: &CableTraceError) {}

    fn model_finished(&mut self, _summary: &ModelSummary) {}

    fn retrace_finished(&mut self, _summary: &RebuildSummary) {}
}

#[derive(Debug)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Sends every decision to `tracing` at debug level.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn endpoints_connected(&mut self, a: &Termination, b: &Termination, status: ConnectionStatus) {
        tracing::debug!("Updating path endpoints: {} <---> {} ({})", a, b, status);
    }

    fn endpoint_cleared(&mut self, a: &Termination, reason: ClearReason) {
        tracing::debug!("Clearing path endpoint: {} ({})", a, reason);
    }

    fn trace_failed(&mut self, termination: &Termination, error: &CableTraceError) {
        tracing::warn!("Aborted reconciliation of {}: {}", termination, error);
    }

    fn model_finished(&mut self, summary: &ModelSummary) {
        tracing::info!(
            "{}: {} processed, {} updated, {} failed",
            summary.kind,
            summary.processed,
            summary.updated,
            summary.failed
        );
    }
}

/// Shared flag checked between terminations of a batch retrace.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_summary_totals() {
        let summary = RebuildSummary {
            models: vec![
                ModelSummary {
                    kind: EndpointKind::Interface,
                    processed: 4,
                    updated: 2,
                    failed: 1,
                },
                ModelSummary {
                    kind: EndpointKind::PowerPort,
                    processed: 3,
                    updated: 0,
                    failed: 0,
                },
            ],
            cancelled: false,
        };
        assert_eq!(summary.total_processed(), 7);
        assert_eq!(summary.total_updated(), 2);
        assert_eq!(summary.total_failed(), 1);
        assert_eq!(summary.model(EndpointKind::PowerPort).unwrap().processed, 3);
    }
}
