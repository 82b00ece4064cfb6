use crate::core::report::{ModelSummary, RebuildSummary, Reporter};
use crate::core::resolver::ClearReason;
use crate::domain::model::{ConnectionStatus, EndpointKind, Termination};
use crate::utils::error::CableTraceError;
use std::io::Write;

/// Operator-facing progress of a retrace run.
///
/// Level 1 prints one line per model plus its count, level 2 spells the count
/// out, level 3 prints every endpoint decision. Level 0 prints nothing.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbosity: u8,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbosity: u8) -> Self {
        Self { out, verbosity }
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, level: u8, message: std::fmt::Arguments<'_>) {
        if self.verbosity >= level {
            // best effort
            let _ = writeln!(self.out, "{}", message);
            let _ = self.out.flush();
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn retrace_started(&mut self, kinds: &[EndpointKind]) {
        self.line(1, format_args!("Retracing {} models.", kinds.len()));
    }

    fn model_started(&mut self, kind: EndpointKind, _endpoints: usize) {
        self.line(1, format_args!("{}...", kind.label()));
    }

    fn endpoints_connected(&mut self, a: &Termination, b: &Termination, _status: ConnectionStatus) {
        self.line(3, format_args!("Updating path endpoints: {} <-> {}", a, b));
    }

    fn endpoint_cleared(&mut self, a: &Termination, _reason: ClearReason) {
        self.line(3, format_args!("Clearing path endpoint: {}", a));
    }

    fn trace_failed(&mut self, termination: &Termination, error: &CableTraceError) {
        self.line(1, format_args!("Skipping {}: {}", termination, error));
    }

    fn model_finished(&mut self, summary: &ModelSummary) {
        if self.verbosity >= 2 {
            self.line(
                2,
                format_args!(
                    "{} {} updated",
                    summary.processed,
                    summary.kind.verbose_name_plural()
                ),
            );
        } else {
            self.line(1, format_args!("{}", summary.processed));
        }
    }

    fn retrace_finished(&mut self, summary: &RebuildSummary) {
        if summary.cancelled {
            self.line(1, format_args!("Cancelled."));
        } else {
            self.line(1, format_args!("Done."));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Role, TerminationId};

    fn interface(id: u64, parent: &str, name: &str) -> Termination {
        Termination::new(
            TerminationId(id),
            parent,
            name,
            Role::Endpoint(EndpointKind::Interface),
        )
    }

    fn summary(processed: usize) -> ModelSummary {
        ModelSummary {
            kind: EndpointKind::Interface,
            processed,
            updated: 1,
            failed: 0,
        }
    }

    fn output(reporter: ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_level_one_prints_counts() {
        let mut reporter = ConsoleReporter::new(Vec::new(), 1);
        reporter.retrace_started(&[EndpointKind::Interface]);
        reporter.model_started(EndpointKind::Interface, 3);
        reporter.endpoint_cleared(&interface(1, "sw1", "eth0"), ClearReason::DeadEnd);
        reporter.model_finished(&summary(3));
        reporter.retrace_finished(&RebuildSummary::default());

        assert_eq!(
            output(reporter),
            "Retracing 1 models.\ndcim.Interface...\n3\nDone.\n"
        );
    }

    #[test]
    fn test_level_three_prints_decisions() {
        let mut reporter = ConsoleReporter::new(Vec::new(), 3);
        reporter.endpoints_connected(
            &interface(1, "sw1", "eth0"),
            &interface(2, "sw2", "eth1"),
            ConnectionStatus::Connected,
        );
        reporter.endpoint_cleared(&interface(3, "sw3", "eth2"), ClearReason::Ambiguous);
        reporter.model_finished(&summary(2));

        assert_eq!(
            output(reporter),
            "Updating path endpoints: sw1 eth0 <-> sw2 eth1\n\
             Clearing path endpoint: sw3 eth2\n\
             2 interfaces updated\n"
        );
    }

    #[test]
    fn test_level_zero_is_silent() {
        let mut reporter = ConsoleReporter::new(Vec::new(), 0);
        reporter.retrace_started(&EndpointKind::ALL);
        reporter.model_finished(&summary(5));
        reporter.retrace_finished(&RebuildSummary::default());
        assert!(output(reporter).is_empty());
    }
}
