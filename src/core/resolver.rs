use crate::core::status::connection_status;
use crate::core::trace::TracedPath;
use crate::domain::model::{ConnectionStatus, Termination};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// Split ends or positions left on the stack.
    Ambiguous,
    /// Nothing at the far end of the path.
    DeadEnd,
    /// The path stops on a front or rear port.
    PassThrough,
}

impl fmt::Display for ClearReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearReason::Ambiguous => write!(f, "ambiguous path"),
            ClearReason::DeadEnd => write!(f, "dead end"),
            ClearReason::PassThrough => write!(f, "ends on a pass-through port"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Both ends are real endpoints; `status` comes from the path traced from `a`.
    Connected {
        a: Termination,
        b: Termination,
        status: ConnectionStatus,
    },
    /// `a` is a real endpoint with nothing to connect to.
    Cleared { a: Termination, reason: ClearReason },
    /// The trace started on a pass-through port; there is no cache to write.
    NotApplicable,
}

/// Decides which pair of real endpoints a traced path connects.
pub fn resolve(path: &TracedPath) -> Resolution {
    let Some(a) = path.start() else {
        return Resolution::NotApplicable;
    };
    if a.is_pass_through() {
        return Resolution::NotApplicable;
    }

    if path.is_ambiguous() {
        return Resolution::Cleared {
            a: a.clone(),
            reason: ClearReason::Ambiguous,
        };
    }

    let b = path.tail().or_else(|| circuit_fallback(path));

    match b {
        Some(b) if b.is_real_endpoint() => Resolution::Connected {
            a: a.clone(),
            b: b.clone(),
            status: connection_status(path),
        },
        Some(_) => Resolution::Cleared {
            a: a.clone(),
            reason: ClearReason::PassThrough,
        },
        None => Resolution::Cleared {
            a: a.clone(),
            reason: ClearReason::DeadEnd,
        },
    }
}

// Legacy behaviour: when a circuit leads nowhere, the circuit termination
// before the dead end stands in as the far endpoint.
// TODO: drop once nothing depends on circuit terminations being reported as the far end of unwired circuits.
fn circuit_fallback(path: &TracedPath) -> Option<&Termination> {
    if path.len() < 2 {
        return None;
    }
    path.segments[path.len() - 2]
        .far
        .as_ref()
        .filter(|termination| termination.is_circuit_termination())
}
