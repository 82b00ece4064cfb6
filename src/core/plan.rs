//! Turns traces into pending cache writes.
//!
//! Nothing here writes to the store. The engine collects a [`ChangeSet`]
//! (invalidate, then resolve) and commits it in one `persist` call.

use crate::core::report::{Reporter, TraceFailure};
use crate::core::resolver::{resolve, Resolution};
use crate::core::status::connection_status;
use crate::core::trace::{Ambiguity, PathTracer};
use crate::domain::model::{CacheUpdate, ConnectionCache, Termination, TerminationId};
use crate::domain::ports::TopologyAccessor;
use crate::utils::error::Result;
use std::collections::{BTreeMap, HashSet};

/// Pending cache writes keyed by termination. A later write to the same
/// termination replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    updates: BTreeMap<TerminationId, ConnectionCache>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, termination: TerminationId, cache: ConnectionCache) {
        self.updates.insert(termination, cache);
    }

    pub fn invalidate(&mut self, termination: TerminationId) {
        self.set(termination, ConnectionCache::cleared());
    }

    pub fn merge(&mut self, other: ChangeSet) {
        self.updates.extend(other.updates);
    }

    pub fn get(&self, termination: TerminationId) -> Option<&ConnectionCache> {
        self.updates.get(&termination)
    }

    pub fn updates(&self) -> Vec<CacheUpdate> {
        self.updates
            .iter()
            .map(|(termination, cache)| CacheUpdate {
                termination: *termination,
                cache: *cache,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

pub struct Planner<'a, A: TopologyAccessor + ?Sized> {
    topology: &'a A,
    tracer: PathTracer<'a, A>,
}

impl<'a, A: TopologyAccessor + ?Sized> Planner<'a, A> {
    pub fn new(topology: &'a A) -> Self {
        Self {
            topology,
            tracer: PathTracer::new(topology),
        }
    }

    /// Plans the cache of one endpoint from its own trace.
    ///
    /// When the far endpoint `b` is not covered by the current run it would
    /// never get its own turn, so its cache is planned here as well, with
    /// the status of the path traced from `b`.
    pub fn plan_endpoint(
        &self,
        endpoint: &Termination,
        covers: &dyn Fn(&Termination) -> bool,
        reporter: &mut dyn Reporter,
    ) -> Result<ChangeSet> {
        let mut changes = ChangeSet::new();
        let path = self.tracer.trace(endpoint)?;

        match resolve(&path) {
            Resolution::Connected { a, b, status } => {
                changes.set(a.id, ConnectionCache::connected(b.id, status));
                if !covers(&b) {
                    let path_b = self.tracer.trace(&b)?;
                    changes.set(
                        b.id,
                        ConnectionCache::connected(a.id, connection_status(&path_b)),
                    );
                }
                reporter.endpoints_connected(&a, &b, status);
            }
            Resolution::Cleared { a, reason } => {
                changes.invalidate(a.id);
                reporter.endpoint_cleared(&a, reason);
            }
            Resolution::NotApplicable => {}
        }

        Ok(changes)
    }

    /// Like [`Planner::plan_endpoint`], but a broken topology only aborts
    /// this endpoint: its cache is cleared and the failure is returned.
    pub fn plan_or_clear(
        &self,
        endpoint: &Termination,
        covers: &dyn Fn(&Termination) -> bool,
        reporter: &mut dyn Reporter,
    ) -> Result<(ChangeSet, Option<TraceFailure>)> {
        match self.plan_endpoint(endpoint, covers, reporter) {
            Ok(changes) => Ok((changes, None)),
            Err(e) if e.is_topology_error() => {
                reporter.trace_failed(endpoint, &e);
                let mut changes = ChangeSet::new();
                if endpoint.is_real_endpoint() {
                    changes.invalidate(endpoint.id);
                }
                Ok((
                    changes,
                    Some(TraceFailure {
                        termination: endpoint.id,
                        message: e.to_string(),
                    }),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Real endpoints whose caches depend on the paths leaving `start`: the
    /// far end of every path and each circuit termination a path crosses.
    /// Split ends fan out over every populated position of the rear port.
    pub fn path_endpoints(&self, start: &Termination) -> Result<Vec<Termination>> {
        let mut seen = HashSet::from([start.id]);
        let mut found = Vec::new();
        self.collect_path_endpoints(start, &mut seen, &mut found)?;
        Ok(found)
    }

    fn collect_path_endpoints(
        &self,
        start: &Termination,
        seen: &mut HashSet<TerminationId>,
        found: &mut Vec<Termination>,
    ) -> Result<()> {
        let path = self.tracer.trace(start)?;

        for segment in &path.segments {
            for termination in std::iter::once(&segment.near).chain(segment.far.as_ref()) {
                if termination.is_circuit_termination() {
                    push_unique(found, termination);
                }
            }
        }

        if let Ambiguity::SplitEnds { rear_port } = path.ambiguity {
            let rear_port = self.topology.termination(rear_port)?;
            for position in 1..=self.topology.positions_count(&rear_port) {
                if let Some(front_port) = self.topology.rear_port_mapping(rear_port.id, position)? {
                    if seen.insert(front_port.id) {
                        self.collect_path_endpoints(&front_port, seen, found)?;
                    }
                }
            }
            return Ok(());
        }

        if let Some(tail) = path.tail() {
            if tail.is_real_endpoint() {
                push_unique(found, tail);
            }
        }
        Ok(())
    }
}

fn push_unique(found: &mut Vec<Termination>, termination: &Termination) {
    if !found.iter().any(|t| t.id == termination.id) {
        found.push(termination.clone());
    }
}
