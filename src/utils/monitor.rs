//! Per-model retrace throughput, with process memory and CPU when the `cli`
//! feature brings in `sysinfo`.

use crate::core::report::{ModelSummary, RebuildSummary};
use crate::domain::model::EndpointKind;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessUsage {
    pub cpu_percent: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
}

/// What retracing one model cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSample {
    pub kind: EndpointKind,
    pub endpoints: usize,
    pub updated: usize,
    pub elapsed: Duration,
    pub endpoints_per_sec: f64,
    /// `None` when the process could not be sampled.
    pub usage: Option<ProcessUsage>,
}

/// Endpoints retraced per second. Zero when no time was measured.
pub fn throughput(endpoints: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        endpoints as f64 / secs
    } else {
        0.0
    }
}

#[cfg(feature = "cli")]
struct ProcessSampler {
    system: System,
    pid: Pid,
}

#[cfg(feature = "cli")]
impl ProcessSampler {
    fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = System::new();
        system.refresh_all();
        Some(Self { system, pid })
    }

    /// CPU percent and resident memory in MB.
    fn sample(&mut self) -> Option<(f32, u64)> {
        self.system.refresh_all();
        let process = self.system.process(self.pid)?;
        Some((process.cpu_usage(), process.memory() / 1024 / 1024))
    }
}

// Without sysinfo only throughput is recorded.
#[cfg(not(feature = "cli"))]
struct ProcessSampler;

#[cfg(not(feature = "cli"))]
impl ProcessSampler {
    fn new() -> Option<Self> {
        None
    }

    fn sample(&mut self) -> Option<(f32, u64)> {
        None
    }
}

/// Records how long each model of a retrace took and logs it.
///
/// Disabled monitors record nothing and never touch the process table.
pub struct SystemMonitor {
    enabled: bool,
    started: Instant,
    model_started: Instant,
    sampler: Option<ProcessSampler>,
    peak_memory_mb: u64,
    samples: Vec<ModelSample>,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let sampler = if enabled { ProcessSampler::new() } else { None };
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            model_started: now,
            sampler,
            peak_memory_mb: 0,
            samples: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn samples(&self) -> &[ModelSample] {
        &self.samples
    }

    pub fn topology_loaded(&mut self, terminations: usize, cables: usize) {
        if !self.enabled {
            return;
        }
        match self.usage() {
            Some(usage) => tracing::info!(
                "📊 Topology loaded: {} terminations, {} cables, Memory: {}MB",
                terminations,
                cables,
                usage.memory_mb
            ),
            None => tracing::info!(
                "📊 Topology loaded: {} terminations, {} cables",
                terminations,
                cables
            ),
        }
    }

    pub fn model_started(&mut self) {
        self.model_started = Instant::now();
    }

    pub fn model_finished(&mut self, summary: &ModelSummary) {
        if !self.enabled {
            return;
        }

        let elapsed = self.model_started.elapsed();
        let sample = ModelSample {
            kind: summary.kind,
            endpoints: summary.processed,
            updated: summary.updated,
            elapsed,
            endpoints_per_sec: throughput(summary.processed, elapsed),
            usage: self.usage(),
        };

        match sample.usage {
            Some(usage) => tracing::info!(
                "📊 {} - {} endpoints in {:?} ({:.0}/s), {} updated, CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
                sample.kind.label(),
                sample.endpoints,
                sample.elapsed,
                sample.endpoints_per_sec,
                sample.updated,
                usage.cpu_percent,
                usage.memory_mb,
                usage.peak_memory_mb
            ),
            None => tracing::info!(
                "📊 {} - {} endpoints in {:?} ({:.0}/s), {} updated",
                sample.kind.label(),
                sample.endpoints,
                sample.elapsed,
                sample.endpoints_per_sec,
                sample.updated
            ),
        }
        self.samples.push(sample);
    }

    pub fn finish(&mut self, summary: &RebuildSummary) {
        if !self.enabled {
            return;
        }
        let elapsed = self.started.elapsed();
        // last sample may raise the peak
        self.usage();
        tracing::info!(
            "📊 Retrace finished - {} endpoints in {:?} ({:.0}/s), Peak Memory: {}MB",
            summary.total_processed(),
            elapsed,
            throughput(summary.total_processed(), elapsed),
            self.peak_memory_mb
        );
    }

    fn usage(&mut self) -> Option<ProcessUsage> {
        let (cpu_percent, memory_mb) = self.sampler.as_mut()?.sample()?;
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);
        Some(ProcessUsage {
            cpu_percent,
            memory_mb,
            peak_memory_mb: self.peak_memory_mb,
        })
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
