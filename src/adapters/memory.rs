use crate::domain::model::{
    Cable, CableId, CableStatus, CacheUpdate, ConnectionCache, EndpointKind, Role, Termination,
    TerminationId,
};
use crate::domain::ports::{TopologyAccessor, TopologyStore};
use crate::utils::error::{StorageError, StorageResult};
use anyhow::anyhow;
use std::collections::{BTreeMap, HashMap};

/// Topology store held entirely in memory.
///
/// The builder methods (`add_*`, [`InMemoryTopology::connect`]) edit the
/// topology directly and never touch connection caches; cable changes that
/// must keep caches current go through the reconciliation engine.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTopology {
    terminations: BTreeMap<TerminationId, Termination>,
    cables: BTreeMap<CableId, Cable>,
    caches: HashMap<TerminationId, ConnectionCache>,
    front_ports: HashMap<(TerminationId, u16), TerminationId>,
    circuit_peers: HashMap<TerminationId, TerminationId>,
    next_termination_id: u64,
    next_cable_id: u64,
    cache_writes: usize,
}

impl InMemoryTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a termination with a caller-chosen id.
    pub fn insert_termination(&mut self, termination: Termination) -> StorageResult<()> {
        if self.terminations.contains_key(&termination.id) {
            return Err(StorageError::Backend(anyhow!(
                "duplicate termination id {}",
                termination.id
            )));
        }

        match termination.role {
            Role::Endpoint(_) => {
                self.caches.insert(termination.id, ConnectionCache::cleared());
            }
            Role::FrontPort {
                rear_port,
                rear_port_position,
            } => {
                if let Some(existing) = self.front_ports.get(&(rear_port, rear_port_position)) {
                    return Err(StorageError::Backend(anyhow!(
                        "position {} of rear port {} is already mapped to {}",
                        rear_port_position,
                        rear_port,
                        existing
                    )));
                }
                self.front_ports
                    .insert((rear_port, rear_port_position), termination.id);
            }
            Role::RearPort { .. } => {}
        }

        self.next_termination_id = self.next_termination_id.max(termination.id.0);
        self.terminations.insert(termination.id, termination);
        Ok(())
    }

    /// Adds a cable record with a caller-chosen id and points both terminations at it.
    pub fn insert_cable(&mut self, cable: Cable) -> StorageResult<()> {
        for id in cable.terminations() {
            self.termination_mut(id)?.cable = Some(cable.id);
        }
        self.next_cable_id = self.next_cable_id.max(cable.id.0);
        self.cables.insert(cable.id, cable);
        Ok(())
    }

    pub fn link_circuit(&mut self, a: TerminationId, z: TerminationId) {
        self.circuit_peers.insert(a, z);
        self.circuit_peers.insert(z, a);
    }

    /// Overwrites a cache without going through `persist`, e.g. to seed stale data.
    pub fn set_cache(&mut self, id: TerminationId, cache: ConnectionCache) -> StorageResult<()> {
        let slot = self
            .caches
            .get_mut(&id)
            .ok_or(StorageError::NoConnectionCache(id))?;
        *slot = cache;
        Ok(())
    }

    pub fn add_endpoint(&mut self, kind: EndpointKind, parent: &str, name: &str) -> TerminationId {
        self.add(parent, name, Role::Endpoint(kind))
    }

    pub fn add_rear_port(&mut self, parent: &str, name: &str, positions: u16) -> TerminationId {
        self.add(parent, name, Role::RearPort { positions })
    }

    pub fn add_front_port(
        &mut self,
        parent: &str,
        name: &str,
        rear_port: TerminationId,
        rear_port_position: u16,
    ) -> TerminationId {
        self.add(
            parent,
            name,
            Role::FrontPort {
                rear_port,
                rear_port_position,
            },
        )
    }

    /// Adds the A and Z terminations of a circuit and links them.
    pub fn add_circuit(&mut self, circuit: &str) -> (TerminationId, TerminationId) {
        let a = self.add_endpoint(EndpointKind::CircuitTermination, circuit, "A");
        let z = self.add_endpoint(EndpointKind::CircuitTermination, circuit, "Z");
        self.link_circuit(a, z);
        (a, z)
    }

    /// Cables two terminations together, bypassing reconciliation.
    pub fn connect(&mut self, a: TerminationId, b: TerminationId, status: CableStatus) -> CableId {
        self.next_cable_id += 1;
        let id = CableId(self.next_cable_id);
        self.cables.insert(id, Cable::new(id, a, b, status));
        for termination in [a, b] {
            if let Some(t) = self.terminations.get_mut(&termination) {
                t.cable = Some(id);
            }
        }
        id
    }

    pub fn terminations(&self) -> impl Iterator<Item = &Termination> {
        self.terminations.values()
    }

    pub fn cables(&self) -> impl Iterator<Item = &Cable> {
        self.cables.values()
    }

    pub fn circuit_peer_id(&self, id: TerminationId) -> Option<TerminationId> {
        self.circuit_peers.get(&id).copied()
    }

    /// Number of cache records changed through `persist` so far.
    pub fn cache_writes(&self) -> usize {
        self.cache_writes
    }

    fn add(&mut self, parent: &str, name: &str, role: Role) -> TerminationId {
        let id = TerminationId(self.next_termination_id + 1);
        self.terminations
            .insert(id, Termination::new(id, parent, name, role));
        self.next_termination_id = id.0;
        match role {
            Role::Endpoint(_) => {
                self.caches.insert(id, ConnectionCache::cleared());
            }
            Role::FrontPort {
                rear_port,
                rear_port_position,
            } => {
                self.front_ports.insert((rear_port, rear_port_position), id);
            }
            Role::RearPort { .. } => {}
        }
        id
    }

    fn termination_mut(&mut self, id: TerminationId) -> StorageResult<&mut Termination> {
        self.terminations
            .get_mut(&id)
            .ok_or(StorageError::TerminationNotFound(id))
    }
}

impl TopologyAccessor for InMemoryTopology {
    fn termination(&self, id: TerminationId) -> StorageResult<Termination> {
        self.terminations
            .get(&id)
            .cloned()
            .ok_or(StorageError::TerminationNotFound(id))
    }

    fn cable(&self, id: CableId) -> StorageResult<Cable> {
        self.cables
            .get(&id)
            .copied()
            .ok_or(StorageError::CableNotFound(id))
    }

    fn rear_port_mapping(
        &self,
        rear_port: TerminationId,
        position: u16,
    ) -> StorageResult<Option<Termination>> {
        if !self.terminations.contains_key(&rear_port) {
            return Err(StorageError::TerminationNotFound(rear_port));
        }
        match self.front_ports.get(&(rear_port, position)) {
            Some(front_port) => self.termination(*front_port).map(Some),
            None => Ok(None),
        }
    }

    fn circuit_peer(&self, termination: TerminationId) -> StorageResult<Option<Termination>> {
        match self.circuit_peers.get(&termination) {
            Some(peer) => self.termination(*peer).map(Some),
            None => Ok(None),
        }
    }

    fn connection_cache(&self, id: TerminationId) -> StorageResult<ConnectionCache> {
        match self.caches.get(&id) {
            Some(cache) => Ok(*cache),
            None if self.terminations.contains_key(&id) => Err(StorageError::NoConnectionCache(id)),
            None => Err(StorageError::TerminationNotFound(id)),
        }
    }

    fn endpoints_of_kind(&self, kind: EndpointKind) -> StorageResult<Vec<TerminationId>> {
        Ok(self
            .terminations
            .values()
            .filter(|t| t.endpoint_kind() == Some(kind))
            .map(|t| t.id)
            .collect())
    }
}

impl TopologyStore for InMemoryTopology {
    fn upsert_cable(&mut self, cable: Cable) -> StorageResult<Option<Cable>> {
        for id in cable.terminations() {
            if !self.terminations.contains_key(&id) {
                return Err(StorageError::TerminationNotFound(id));
            }
        }
        self.next_cable_id = self.next_cable_id.max(cable.id.0);
        Ok(self.cables.insert(cable.id, cable))
    }

    fn remove_cable(&mut self, id: CableId) -> StorageResult<Cable> {
        self.cables.remove(&id).ok_or(StorageError::CableNotFound(id))
    }

    fn set_termination_cable(
        &mut self,
        termination: TerminationId,
        cable: Option<CableId>,
    ) -> StorageResult<bool> {
        let termination = self.termination_mut(termination)?;
        if termination.cable == cable {
            return Ok(false);
        }
        termination.cable = cable;
        Ok(true)
    }

    fn persist(&mut self, updates: &[CacheUpdate]) -> StorageResult<usize> {
        // Validate everything first so a bad update leaves the store untouched.
        for update in updates {
            self.connection_cache(update.termination)?;
        }

        let mut changed = 0;
        for update in updates {
            if let Some(cache) = self.caches.get_mut(&update.termination) {
                if *cache != update.cache {
                    *cache = update.cache;
                    changed += 1;
                }
            }
        }
        self.cache_writes += changed;
        Ok(changed)
    }
}
