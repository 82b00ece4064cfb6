use crate::adapters::json_file::JsonTopologyFile;
use crate::core::engine::ReconciliationEngine;
use crate::core::report::{
    CancellationFlag, ModelSummary, RebuildSummary, Reporter, TracingReporter,
};
use crate::core::resolver::ClearReason;
use crate::domain::kinds::ModelSelection;
use crate::domain::model::{ConnectionStatus, EndpointKind, Termination};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CableTraceError, Result};
use crate::utils::monitor::SystemMonitor;
use std::path::PathBuf;

/// Outcome of one retrace run. The reporter is handed back so callers can
/// inspect what it collected.
#[derive(Debug)]
pub struct RetraceRun<R> {
    pub summary: RebuildSummary,
    /// File the retraced topology was written to, `None` when nothing was saved.
    pub saved_to: Option<PathBuf>,
    pub reporter: R,
}

/// Loads a topology document, rebuilds its connection caches and saves it.
pub struct RetraceApp<C: ConfigProvider> {
    config: C,
    cancel: CancellationFlag,
}

impl<C: ConfigProvider> RetraceApp<C> {
    pub fn new(config: C, cancel: CancellationFlag) -> Self {
        Self { config, cancel }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Runs the scan on a blocking task; the flag given to [`RetraceApp::new`]
    /// stops it between two terminations.
    pub async fn run<R>(&self, reporter: R) -> Result<RetraceRun<R>>
    where
        R: Reporter + Send + 'static,
    {
        let selection = ModelSelection::parse(self.config.models())?;
        let source = JsonTopologyFile::new(self.config.topology_path());
        let destination = self.config.output_path().map(JsonTopologyFile::new);
        let dry_run = self.config.dry_run();
        let monitor_enabled = self.config.monitor();
        let cancel = self.cancel.clone();

        tracing::info!("Loading topology from {}", source.path().display());
        if monitor_enabled {
            tracing::info!("🔍 System monitoring enabled");
        }

        let task = tokio::task::spawn_blocking(move || -> Result<RetraceRun<R>> {
            let mut monitor = SystemMonitor::new(monitor_enabled);
            let topology = source.load()?;
            monitor.topology_loaded(topology.terminations().count(), topology.cables().count());

            let mut engine = ReconciliationEngine::new(topology);
            let mut reporter = MonitoredReporter {
                inner: reporter,
                log: TracingReporter,
                monitor,
            };
            let summary = engine.rebuild(&selection, &mut reporter, &cancel)?;
            let MonitoredReporter {
                inner: reporter,
                mut monitor,
                ..
            } = reporter;

            let target = match destination {
                Some(file) => Some(file),
                // Rewriting the source is skipped when no cache changed.
                None if summary.total_updated() > 0 => Some(source),
                None => None,
            };

            let saved_to = match target {
                Some(file) if !dry_run => {
                    file.save(&engine.into_store())?;
                    tracing::info!("📁 Topology saved to {}", file.path().display());
                    Some(file.path().to_path_buf())
                }
                Some(file) => {
                    tracing::info!("Dry run: not writing {}", file.path().display());
                    None
                }
                None => None,
            };

            monitor.finish(&summary);
            Ok(RetraceRun {
                summary,
                saved_to,
                reporter,
            })
        });

        task.await.map_err(|e| CableTraceError::TaskError {
            message: format!("retrace task failed: {}", e),
        })?
    }
}

/// Forwards every event to the caller's reporter and to the log, and times
/// each model on the monitor.
struct MonitoredReporter<R> {
    inner: R,
    log: TracingReporter,
    monitor: SystemMonitor,
}

impl<R: Reporter> Reporter for MonitoredReporter<R> {
    fn retrace_started(&mut self, kinds: &[EndpointKind]) {
        self.inner.retrace_started(kinds);
    }

    fn model_started(&mut self, kind: EndpointKind, endpoints: usize) {
        self.monitor.model_started();
        self.inner.model_started(kind, endpoints);
    }

    fn endpoints_connected(&mut self, a: &Termination, b: &Termination, status: ConnectionStatus) {
        self.log.endpoints_connected(a, b, status);
        self.inner.endpoints_connected(a, b, status);
    }

    fn endpoint_cleared(&mut self, a: &Termination, reason: ClearReason) {
        self.log.endpoint_cleared(a, reason);
        self.inner.endpoint_cleared(a, reason);
    }

    fn trace_failed(&mut self, termination: &Termination, error: &CableTraceError) {
        self.log.trace_failed(termination, error);
        self.inner.trace_failed(termination, error);
    }

    fn model_finished(&mut self, summary: &ModelSummary) {
        self.log.model_finished(summary);
        self.monitor.model_finished(summary);
        self.inner.model_finished(summary);
    }

    fn retrace_finished(&mut self, summary: &RebuildSummary) {
        self.inner.retrace_finished(summary);
    }
}
