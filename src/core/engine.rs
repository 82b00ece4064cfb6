use crate::core::plan::{ChangeSet, Planner};
use crate::core::report::{
    CancellationFlag, ModelSummary, RebuildSummary, ReconcileSummary, Reporter, TraceFailure,
};
use crate::core::trace::{PathTracer, TracedPath};
use crate::domain::kinds::ModelSelection;
use crate::domain::model::{Cable, CableId, EndpointKind, Termination, TerminationId};
use crate::domain::ports::{TopologyAccessor, TopologyStore};
use crate::utils::error::{CableTraceError, Result, StorageError};
use std::collections::HashSet;

/// A cable mutation the cache has to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CableEvent {
    /// A cable was created or updated.
    Saved(Cable),
    Deleted(CableId),
}

/// Keeps the connection caches of a topology store in line with its cables.
///
/// Cable mutations go through [`ReconciliationEngine::reconcile`], which
/// applies the mutation and the resulting cache writes as one unit of work.
pub struct ReconciliationEngine<S: TopologyStore> {
    store: S,
}

impl<S: TopologyStore> ReconciliationEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn trace(&self, termination: TerminationId) -> Result<TracedPath> {
        let start = self.store.termination(termination)?;
        PathTracer::new(&self.store).trace(&start)
    }

    pub fn reconcile(
        &mut self,
        event: CableEvent,
        reporter: &mut dyn Reporter,
    ) -> Result<ReconcileSummary> {
        match event {
            CableEvent::Saved(cable) => self.cable_saved(cable, reporter),
            CableEvent::Deleted(id) => self.cable_deleted(id, reporter),
        }
    }

    pub fn save_cable(
        &mut self,
        cable: Cable,
        reporter: &mut dyn Reporter,
    ) -> Result<ReconcileSummary> {
        self.reconcile(CableEvent::Saved(cable), reporter)
    }

    pub fn delete_cable(
        &mut self,
        id: CableId,
        reporter: &mut dyn Reporter,
    ) -> Result<ReconcileSummary> {
        self.reconcile(CableEvent::Deleted(id), reporter)
    }

    fn cable_saved(&mut self, cable: Cable, reporter: &mut dyn Reporter) -> Result<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();

        // A rejected cable must leave the store untouched, so validate before tearing anything down.
        let previous = self.existing_cable(cable.id)?;
        self.validate_cable(&cable)?;

        if let Some(previous) = previous {
            if previous.terminations() != cable.terminations() {
                tracing::debug!("Cable {} moved to new terminations; tearing down the old path", cable);
                summary = self.cable_deleted(previous.id, reporter)?;
            }
        }

        self.store.upsert_cable(cable)?;
        for (side, termination) in ["A", "B"].iter().zip(cable.terminations()) {
            if self.store.set_termination_cable(termination, Some(cable.id))? {
                tracing::debug!("Updating termination {} for cable {}", side, cable);
            }
        }

        let endpoints = self.collect_endpoints(&cable, reporter, &mut summary.failures)?;
        let mut changes = ChangeSet::new();
        self.resolve_endpoints(&endpoints, &mut changes, reporter, &mut summary.failures)?;

        summary.endpoints += endpoints.len();
        summary.written += self.store.persist(&changes.updates())?;
        Ok(summary)
    }

    fn cable_deleted(&mut self, id: CableId, reporter: &mut dyn Reporter) -> Result<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();
        let cable = self.store.cable(id)?;

        // Collected while the cable still carries its paths.
        let endpoints = self.collect_endpoints(&cable, reporter, &mut summary.failures)?;

        for (side, termination) in ["A", "B"].iter().zip(cable.terminations()) {
            if self.store.termination(termination)?.cable == Some(id) {
                tracing::debug!("Nullifying termination {} for cable {}", side, cable);
                self.store.set_termination_cable(termination, None)?;
            }
        }
        self.store.remove_cable(id)?;

        let mut changes = ChangeSet::new();
        for endpoint in &endpoints {
            tracing::debug!("Removing path information for {}", self.store.termination(*endpoint)?);
            changes.invalidate(*endpoint);
        }
        self.resolve_endpoints(&endpoints, &mut changes, reporter, &mut summary.failures)?;

        summary.endpoints = endpoints.len();
        summary.written = self.store.persist(&changes.updates())?;
        Ok(summary)
    }

    fn existing_cable(&self, id: CableId) -> Result<Option<Cable>> {
        match self.store.cable(id) {
            Ok(cable) => Ok(Some(cable)),
            Err(StorageError::CableNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn validate_cable(&self, cable: &Cable) -> Result<()> {
        if cable.termination_a == cable.termination_b {
            return Err(CableTraceError::InvalidCable {
                cable: cable.id,
                reason: "both ends attach to the same termination".to_string(),
            });
        }

        for id in cable.terminations() {
            let termination = self.store.termination(id)?;
            if let Some(attached) = termination.cable {
                if attached != cable.id {
                    return Err(CableTraceError::TerminationOccupied {
                        termination: id,
                        cable: attached,
                    });
                }
            }
        }
        Ok(())
    }

    /// Real endpoints whose caches depend on `cable`: its own terminations
    /// when they are endpoints, plus every endpoint the paths leaving them
    /// reach or cross.
    fn collect_endpoints(
        &self,
        cable: &Cable,
        reporter: &mut dyn Reporter,
        failures: &mut Vec<TraceFailure>,
    ) -> Result<Vec<TerminationId>> {
        let planner = Planner::new(&self.store);
        let mut endpoints: Vec<TerminationId> = Vec::new();

        for id in cable.terminations() {
            let termination = self.store.termination(id)?;
            if termination.is_real_endpoint() && !endpoints.contains(&id) {
                endpoints.push(id);
            }
            match planner.path_endpoints(&termination) {
                Ok(found) => {
                    for endpoint in found {
                        if !endpoints.contains(&endpoint.id) {
                            endpoints.push(endpoint.id);
                        }
                    }
                }
                Err(e) if e.is_topology_error() => {
                    reporter.trace_failed(&termination, &e);
                    failures.push(TraceFailure {
                        termination: id,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(endpoints)
    }

    fn resolve_endpoints(
        &self,
        endpoints: &[TerminationId],
        changes: &mut ChangeSet,
        reporter: &mut dyn Reporter,
        failures: &mut Vec<TraceFailure>,
    ) -> Result<()> {
        let planner = Planner::new(&self.store);
        let covered: HashSet<TerminationId> = endpoints.iter().copied().collect();
        let covers = |t: &Termination| covered.contains(&t.id);

        for id in endpoints {
            // Re-read: the copy collected before a mutation may point at a removed cable.
            let endpoint = self.store.termination(*id)?;
            let (planned, failure) = planner.plan_or_clear(&endpoint, &covers, reporter)?;
            changes.merge(planned);
            failures.extend(failure);
        }
        Ok(())
    }

    /// Recomputes the cache of every endpoint of the selected kinds.
    ///
    /// Each termination is planned and committed on its own, so a
    /// cancellation between two terminations leaves nothing half written.
    pub fn rebuild(
        &mut self,
        selection: &ModelSelection,
        reporter: &mut dyn Reporter,
        cancel: &CancellationFlag,
    ) -> Result<RebuildSummary> {
        tracing::info!("Retracing {} models", selection.len());
        reporter.retrace_started(selection.kinds());

        let mut summary = RebuildSummary::default();
        for &kind in selection.kinds() {
            let (model, cancelled) = self.rebuild_model(kind, selection, reporter, cancel)?;
            reporter.model_finished(&model);
            summary.models.push(model);
            if cancelled {
                tracing::warn!("Retrace cancelled while processing {}", kind);
                summary.cancelled = true;
                break;
            }
        }

        reporter.retrace_finished(&summary);
        tracing::info!(
            "Retrace finished: {} endpoints processed, {} updated, {} failed",
            summary.total_processed(),
            summary.total_updated(),
            summary.total_failed()
        );
        Ok(summary)
    }

    fn rebuild_model(
        &mut self,
        kind: EndpointKind,
        selection: &ModelSelection,
        reporter: &mut dyn Reporter,
        cancel: &CancellationFlag,
    ) -> Result<(ModelSummary, bool)> {
        let ids = self.store.endpoints_of_kind(kind)?;
        reporter.model_started(kind, ids.len());
        tracing::debug!("{}: {} endpoints to retrace", kind, ids.len());

        let covers = |t: &Termination| {
            t.endpoint_kind()
                .map(|kind| selection.contains(kind))
                .unwrap_or(false)
        };

        let mut model = ModelSummary::new(kind);
        for id in ids {
            if cancel.is_cancelled() {
                return Ok((model, true));
            }

            let endpoint = self.store.termination(id)?;
            let (changes, failure) =
                Planner::new(&self.store).plan_or_clear(&endpoint, &covers, reporter)?;
            if failure.is_some() {
                model.failed += 1;
            }

            model.updated += self.store.persist(&changes.updates())?;
            model.processed += 1;
        }
        Ok((model, false))
    }
}
