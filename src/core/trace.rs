use crate::domain::model::{Cable, Role, Termination, TerminationId};
use crate::domain::ports::TopologyAccessor;
use crate::utils::error::{CableTraceError, Result};
use std::collections::HashMap;

/// One hop of a traced path: `near` and whatever its cable lands on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub near: Termination,
    pub cable: Option<Cable>,
    pub far: Option<Termination>,
}

/// Why a trace could not settle on a single far end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ambiguity {
    None,
    /// Reached a multi-position rear port with nothing on the position stack.
    SplitEnds { rear_port: TerminationId },
    /// The path ended while positions were still waiting to be unwound.
    UnresolvedStack { positions: Vec<u16> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedPath {
    pub segments: Vec<PathSegment>,
    pub ambiguity: Ambiguity,
}

impl TracedPath {
    pub fn start(&self) -> Option<&Termination> {
        self.segments.first().map(|segment| &segment.near)
    }

    /// Far end of the last segment.
    pub fn tail(&self) -> Option<&Termination> {
        self.segments.last().and_then(|segment| segment.far.as_ref())
    }

    pub fn is_ambiguous(&self) -> bool {
        self.ambiguity != Ambiguity::None
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A termination met again at the last step, first met at step `earlier`,
/// closes a loop when the position stack never dropped below its depth at
/// `earlier`: nothing below that depth was read, so the same walk repeats.
/// Re-entering a rear port on another position pops below that depth first.
fn repeats_from(depths: &[usize], earlier: usize) -> bool {
    let floor = depths[earlier];
    depths[earlier..].iter().all(|&depth| depth >= floor)
}

/// Walks cables and pass-through ports outward from a termination.
pub struct PathTracer<'a, A: TopologyAccessor + ?Sized> {
    topology: &'a A,
}

impl<'a, A: TopologyAccessor + ?Sized> PathTracer<'a, A> {
    pub fn new(topology: &'a A) -> Self {
        Self { topology }
    }

    pub fn trace(&self, start: &Termination) -> Result<TracedPath> {
        tracing::debug!("Tracing cable path from {} (#{})", start, start.id);

        let mut segments = Vec::new();
        let mut position_stack: Vec<u16> = Vec::new();
        // Stack depth at every step, and the steps at which each termination was current.
        let mut depths: Vec<usize> = Vec::new();
        let mut visits: HashMap<TerminationId, Vec<usize>> = HashMap::new();
        let mut current = start.clone();

        loop {
            let step = depths.len();
            depths.push(position_stack.len());
            if let Some(earlier) = visits.get(&current.id) {
                if earlier.iter().any(|&k| repeats_from(&depths, k)) {
                    tracing::warn!("Loop detected at {} while tracing from {}", current, start);
                    return Err(CableTraceError::CycleDetected {
                        start: start.id,
                        revisited: current.id,
                    });
                }
            }
            visits.entry(current.id).or_default().push(step);

            let cable = match self.topology.get_cable(&current)? {
                Some(cable) => cable,
                None => {
                    tracing::debug!("No cable connected to {}", current);
                    segments.push(PathSegment {
                        near: current,
                        cable: None,
                        far: None,
                    });
                    break;
                }
            };

            let far = self.topology.get_far_side(&cable, current.id)?;
            tracing::debug!(
                "{} --- Cable {} ({:?}) ---> {}",
                current,
                cable,
                cable.status,
                far.as_ref()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "nothing".to_string())
            );
            segments.push(PathSegment {
                near: current,
                cable: Some(cable),
                far: far.clone(),
            });

            let Some(next) = far else {
                break;
            };

            let continuation = match next.role {
                Role::Endpoint(_) => self.cross_circuit(&next)?,
                Role::FrontPort { .. } => self.enter_rear_port(&next, &mut position_stack)?,
                Role::RearPort { positions } => {
                    if positions > 1 && position_stack.is_empty() {
                        tracing::debug!("Path splits at {} ({} positions)", next, positions);
                        return Ok(TracedPath {
                            segments,
                            ambiguity: Ambiguity::SplitEnds { rear_port: next.id },
                        });
                    }
                    self.leave_rear_port(&next, positions, &mut position_stack)?
                }
            };

            match continuation {
                Some(peer) => current = peer,
                None => break,
            }
        }

        let ambiguity = if position_stack.is_empty() {
            Ambiguity::None
        } else {
            Ambiguity::UnresolvedStack {
                positions: position_stack,
            }
        };

        Ok(TracedPath {
            segments,
            ambiguity,
        })
    }

    /// A circuit termination carries the path over its circuit to the peer
    /// termination. Every other endpoint ends the path.
    fn cross_circuit(&self, endpoint: &Termination) -> Result<Option<Termination>> {
        if !endpoint.is_circuit_termination() {
            return Ok(None);
        }
        Ok(self.topology.circuit_peer(endpoint.id)?)
    }

    fn enter_rear_port(
        &self,
        front_port: &Termination,
        position_stack: &mut Vec<u16>,
    ) -> Result<Option<Termination>> {
        let Some((rear_port, position)) = self.topology.front_port_mapping(front_port)? else {
            return Ok(None);
        };

        // Only many-to-one points need remembering; single position rear ports always map back to 1.
        if self.topology.positions_count(&rear_port) > 1 {
            position_stack.push(position);
        }
        Ok(Some(rear_port))
    }

    fn leave_rear_port(
        &self,
        rear_port: &Termination,
        positions: u16,
        position_stack: &mut Vec<u16>,
    ) -> Result<Option<Termination>> {
        let position = if positions > 1 {
            match position_stack.pop() {
                Some(position) => position,
                None => return Ok(None),
            }
        } else {
            1
        };

        if position < 1 || position > positions {
            return Err(CableTraceError::InvalidPosition {
                rear_port: rear_port.id,
                positions,
                position,
            });
        }

        Ok(self.topology.rear_port_mapping(rear_port.id, position)?)
    }
}
