pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, LogFormat};
pub use config::{RetraceSettings, TomlConfig};

pub use adapters::{InMemoryTopology, JsonTopologyFile, TopologyDocument};
pub use app::{ConsoleReporter, RetraceApp, RetraceRun};
pub use core::engine::{CableEvent, ReconciliationEngine};
pub use core::report::{CancellationFlag, NullReporter, Reporter, TracingReporter};
pub use core::trace::{PathTracer, TracedPath};
pub use utils::error::{CableTraceError, Result};
