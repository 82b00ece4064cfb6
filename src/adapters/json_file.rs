use crate::adapters::memory::InMemoryTopology;
use crate::domain::model::{
    Cable, ConnectionCache, ConnectionStatus, Role, Termination, TerminationId, TerminationKind,
};
use crate::domain::ports::TopologyAccessor;
use crate::utils::error::{CableTraceError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk snapshot of a topology and its connection caches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyDocument {
    pub terminations: Vec<TerminationRecord>,
    #[serde(default)]
    pub cables: Vec<Cable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationRecord {
    pub id: TerminationId,
    /// `app_label.modelname`, e.g. `dcim.interface`.
    pub kind: String,
    pub parent: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rear_port: Option<TerminationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rear_port_position: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<TerminationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_endpoint: Option<TerminationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_status: Option<ConnectionStatus>,
}

fn invalid(message: String) -> CableTraceError {
    CableTraceError::InvalidDocument { message }
}

impl TerminationRecord {
    fn role(&self) -> Result<Role> {
        let kind = TerminationKind::from_document_label(&self.kind).ok_or_else(|| {
            invalid(format!(
                "termination {} has unsupported kind '{}'",
                self.id, self.kind
            ))
        })?;

        Ok(match kind {
            TerminationKind::Endpoint(kind) => Role::Endpoint(kind),
            TerminationKind::RearPort => Role::RearPort {
                positions: self.positions.unwrap_or(1),
            },
            TerminationKind::FrontPort => Role::FrontPort {
                rear_port: self.rear_port.ok_or_else(|| {
                    invalid(format!("front port {} has no rear_port", self.id))
                })?,
                rear_port_position: self.rear_port_position.unwrap_or(1),
            },
        })
    }

    fn from_termination(termination: &Termination, topology: &InMemoryTopology) -> Result<Self> {
        let mut record = Self {
            id: termination.id,
            kind: termination.kind().document_label(),
            parent: termination.parent.clone(),
            name: termination.name.clone(),
            positions: None,
            rear_port: None,
            rear_port_position: None,
            peer: None,
            connected_endpoint: None,
            connection_status: None,
        };

        match termination.role {
            Role::Endpoint(_) => {
                let cache = topology.connection_cache(termination.id)?;
                record.connected_endpoint = cache.connected_endpoint;
                record.connection_status = cache.connection_status;
                record.peer = topology.circuit_peer_id(termination.id);
            }
            Role::FrontPort {
                rear_port,
                rear_port_position,
            } => {
                record.rear_port = Some(rear_port);
                record.rear_port_position = Some(rear_port_position);
            }
            Role::RearPort { positions } => record.positions = Some(positions),
        }
        Ok(record)
    }
}

impl TopologyDocument {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds a store from the document. Cable pointers on terminations are
    /// derived from the cable list.
    pub fn into_topology(self) -> Result<InMemoryTopology> {
        let mut topology = InMemoryTopology::new();

        for record in &self.terminations {
            let termination = Termination::new(record.id, &record.parent, &record.name, record.role()?);
            topology.insert_termination(termination)?;
        }

        for record in &self.terminations {
            if let Role::FrontPort { rear_port, .. } = record.role()? {
                match topology.termination(rear_port) {
                    Ok(rear) if matches!(rear.role, Role::RearPort { .. }) => {}
                    _ => {
                        return Err(invalid(format!(
                            "front port {} maps onto {}, which is not a rear port",
                            record.id, rear_port
                        )))
                    }
                }
            }
            if let Some(peer) = record.peer {
                let peer_termination = topology.termination(peer).map_err(|_| {
                    invalid(format!("termination {} has unknown peer {}", record.id, peer))
                })?;
                if !peer_termination.is_circuit_termination() {
                    return Err(invalid(format!(
                        "peer {} of termination {} is not a circuit termination",
                        peer, record.id
                    )));
                }
                topology.link_circuit(record.id, peer);
            }
            if record.connected_endpoint.is_some() || record.connection_status.is_some() {
                topology.set_cache(
                    record.id,
                    ConnectionCache {
                        connected_endpoint: record.connected_endpoint,
                        connection_status: record.connection_status,
                    },
                )?;
            }
        }

        for cable in self.cables {
            for id in cable.terminations() {
                let termination = topology
                    .termination(id)
                    .map_err(|_| invalid(format!("cable {} references unknown termination {}", cable.id, id)))?;
                if let Some(other) = termination.cable {
                    return Err(invalid(format!(
                        "termination {} is attached to both cable {} and cable {}",
                        id, other, cable.id
                    )));
                }
            }
            topology.insert_cable(cable)?;
        }

        Ok(topology)
    }

    pub fn from_topology(topology: &InMemoryTopology) -> Result<Self> {
        let terminations = topology
            .terminations()
            .map(|t| TerminationRecord::from_termination(t, topology))
            .collect::<Result<Vec<_>>>()?;
        let cables = topology.cables().copied().collect();
        Ok(Self {
            terminations,
            cables,
        })
    }
}

/// A topology document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonTopologyFile {
    path: PathBuf,
}

impl JsonTopologyFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<InMemoryTopology> {
        tracing::debug!("Loading topology from {}", self.path.display());
        let content = fs::read_to_string(&self.path)?;
        let document = TopologyDocument::from_json(&content)?;
        tracing::debug!(
            "Loaded {} terminations and {} cables",
            document.terminations.len(),
            document.cables.len()
        );
        document.into_topology()
    }

    pub fn save(&self, topology: &InMemoryTopology) -> Result<()> {
        let json = TopologyDocument::from_topology(topology)?.to_json()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, json)?;
        tracing::debug!("Topology written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CableId, CableStatus, EndpointKind};

    const PANEL: &str = r#"{
        "terminations": [
            {"id": 1, "kind": "dcim.interface", "parent": "sw1", "name": "eth0",
             "connected_endpoint": 4, "connection_status": "planned"},
            {"id": 2, "kind": "dcim.rearport", "parent": "pp1", "name": "R1"},
            {"id": 3, "kind": "dcim.frontport", "parent": "pp1", "name": "F1",
             "rear_port": 2, "rear_port_position": 1},
            {"id": 4, "kind": "dcim.interface", "parent": "sw2", "name": "eth0"},
            {"id": 5, "kind": "circuits.circuittermination", "parent": "CID-1", "name": "A", "peer": 6},
            {"id": 6, "kind": "circuits.circuittermination", "parent": "CID-1", "name": "Z"}
        ],
        "cables": [
            {"id": 10, "termination_a": 1, "termination_b": 2, "status": "connected"},
            {"id": 11, "termination_a": 3, "termination_b": 4, "status": "planned"}
        ]
    }"#;

    #[test]
    fn test_document_into_topology() {
        let topology = TopologyDocument::from_json(PANEL)
            .unwrap()
            .into_topology()
            .unwrap();

        let iface = topology.termination(TerminationId(1)).unwrap();
        assert_eq!(iface.role, Role::Endpoint(EndpointKind::Interface));
        assert_eq!(iface.cable, Some(CableId(10)));
        assert_eq!(
            topology.termination(TerminationId(2)).unwrap().role,
            Role::RearPort { positions: 1 }
        );
        assert_eq!(topology.cable(CableId(11)).unwrap().status, CableStatus::Planned);
        assert_eq!(
            topology.connection_cache(TerminationId(1)).unwrap(),
            ConnectionCache::connected(TerminationId(4), ConnectionStatus::Planned)
        );
        assert_eq!(
            topology.circuit_peer(TerminationId(6)).unwrap().map(|t| t.id),
            Some(TerminationId(5))
        );
    }

    #[test]
    fn test_document_written_back_keeps_caches() {
        let topology = TopologyDocument::from_json(PANEL)
            .unwrap()
            .into_topology()
            .unwrap();

        let document = TopologyDocument::from_topology(&topology).unwrap();
        let iface = document
            .terminations
            .iter()
            .find(|t| t.id == TerminationId(1))
            .unwrap();

        assert_eq!(iface.kind, "dcim.interface");
        assert_eq!(iface.connected_endpoint, Some(TerminationId(4)));
        assert_eq!(document.cables.len(), 2);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let json = r#"{"terminations": [{"id": 1, "kind": "dcim.device", "parent": "sw1", "name": "x"}]}"#;
        let err = TopologyDocument::from_json(json)
            .unwrap()
            .into_topology()
            .unwrap_err();
        assert!(matches!(err, CableTraceError::InvalidDocument { .. }));
    }

    #[test]
    fn test_rejects_double_cabled_termination() {
        let json = r#"{
            "terminations": [
                {"id": 1, "kind": "dcim.interface", "parent": "sw1", "name": "eth0"},
                {"id": 2, "kind": "dcim.interface", "parent": "sw2", "name": "eth0"},
                {"id": 3, "kind": "dcim.interface", "parent": "sw3", "name": "eth0"}
            ],
            "cables": [
                {"id": 1, "termination_a": 1, "termination_b": 2, "status": "connected"},
                {"id": 2, "termination_a": 1, "termination_b": 3, "status": "connected"}
            ]
        }"#;
        let err = TopologyDocument::from_json(json)
            .unwrap()
            .into_topology()
            .unwrap_err();
        assert!(matches!(err, CableTraceError::InvalidDocument { .. }));
    }
}
