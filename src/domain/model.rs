use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::domain::kinds::{EndpointKind, TerminationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminationId(pub u64);

impl fmt::Display for TerminationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CableId(pub u64);

impl fmt::Display for CableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a termination does to a path running through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A final connection point. Carries a connection cache.
    Endpoint(EndpointKind),
    /// Patch panel front port, mapped onto one position of a rear port.
    FrontPort {
        rear_port: TerminationId,
        rear_port_position: u16,
    },
    /// Patch panel rear port exposing `positions` front-port positions.
    RearPort { positions: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub id: TerminationId,
    /// Device (or circuit) the termination belongs to.
    pub parent: String,
    pub name: String,
    pub cable: Option<CableId>,
    pub role: Role,
}

impl Termination {
    pub fn new(id: TerminationId, parent: &str, name: &str, role: Role) -> Self {
        Self {
            id,
            parent: parent.to_string(),
            name: name.to_string(),
            cable: None,
            role,
        }
    }

    pub fn kind(&self) -> TerminationKind {
        match self.role {
            Role::Endpoint(kind) => TerminationKind::Endpoint(kind),
            Role::FrontPort { .. } => TerminationKind::FrontPort,
            Role::RearPort { .. } => TerminationKind::RearPort,
        }
    }

    pub fn has_cable(&self) -> bool {
        self.cable.is_some()
    }

    pub fn endpoint_kind(&self) -> Option<EndpointKind> {
        match self.role {
            Role::Endpoint(kind) => Some(kind),
            Role::FrontPort { .. } | Role::RearPort { .. } => None,
        }
    }

    pub fn is_real_endpoint(&self) -> bool {
        self.endpoint_kind().is_some()
    }

    pub fn is_pass_through(&self) -> bool {
        !self.is_real_endpoint()
    }

    pub fn is_circuit_termination(&self) -> bool {
        self.endpoint_kind() == Some(EndpointKind::CircuitTermination)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.parent, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CableStatus {
    Connected,
    Planned,
    Decommissioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    pub id: CableId,
    pub termination_a: TerminationId,
    pub termination_b: TerminationId,
    pub status: CableStatus,
}

impl Cable {
    pub fn new(
        id: CableId,
        termination_a: TerminationId,
        termination_b: TerminationId,
        status: CableStatus,
    ) -> Self {
        Self {
            id,
            termination_a,
            termination_b,
            status,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == CableStatus::Connected
    }

    /// The termination on the opposite side of `termination`, if it is one of ours.
    pub fn far_side(&self, termination: TerminationId) -> Option<TerminationId> {
        if termination == self.termination_a {
            Some(self.termination_b)
        } else if termination == self.termination_b {
            Some(self.termination_a)
        } else {
            None
        }
    }

    pub fn terminations(&self) -> [TerminationId; 2] {
        [self.termination_a, self.termination_b]
    }
}

impl fmt::Display for Cable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Planned,
}

impl From<bool> for ConnectionStatus {
    fn from(fully_connected: bool) -> Self {
        if fully_connected {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Planned
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Planned => write!(f, "planned"),
        }
    }
}

/// Cached result of tracing a real endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCache {
    pub connected_endpoint: Option<TerminationId>,
    pub connection_status: Option<ConnectionStatus>,
}

impl ConnectionCache {
    pub fn connected(endpoint: TerminationId, status: ConnectionStatus) -> Self {
        Self {
            connected_endpoint: Some(endpoint),
            connection_status: Some(status),
        }
    }

    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_cleared(&self) -> bool {
        self.connected_endpoint.is_none() && self.connection_status.is_none()
    }
}

/// One pending write of a connection cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheUpdate {
    pub termination: TerminationId,
    pub cache: ConnectionCache,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_far_side() {
        let cable = Cable::new(
            CableId(1),
            TerminationId(10),
            TerminationId(20),
            CableStatus::Connected,
        );
        assert_eq!(cable.far_side(TerminationId(10)), Some(TerminationId(20)));
        assert_eq!(cable.far_side(TerminationId(20)), Some(TerminationId(10)));
        assert_eq!(cable.far_side(TerminationId(30)), None);
    }

    #[test]
    fn test_pass_through_roles() {
        let rear = Termination::new(TerminationId(1), "pp1", "R1", Role::RearPort { positions: 4 });
        let front = Termination::new(
            TerminationId(2),
            "pp1",
            "F1",
            Role::FrontPort {
                rear_port: TerminationId(1),
                rear_port_position: 1,
            },
        );
        let iface = Termination::new(
            TerminationId(3),
            "sw1",
            "eth0",
            Role::Endpoint(EndpointKind::Interface),
        );

        assert!(rear.is_pass_through());
        assert!(front.is_pass_through());
        assert!(iface.is_real_endpoint());
        assert!(!iface.is_circuit_termination());
        assert_eq!(iface.to_string(), "sw1 eth0");
    }

    #[test]
    fn test_status_from_path_result() {
        assert_eq!(ConnectionStatus::from(true), ConnectionStatus::Connected);
        assert_eq!(ConnectionStatus::from(false), ConnectionStatus::Planned);
        assert!(ConnectionCache::cleared().is_cleared());
    }
}
