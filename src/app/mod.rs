pub mod console;
pub mod retrace;

pub use console::ConsoleReporter;
pub use retrace::{RetraceApp, RetraceRun};
