use crate::domain::model::{
    Cable, CableId, CacheUpdate, ConnectionCache, EndpointKind, Role, Termination, TerminationId,
};
use crate::utils::error::StorageResult;

/// Read side of the topology store. Tracing only ever goes through this trait.
pub trait TopologyAccessor {
    fn termination(&self, id: TerminationId) -> StorageResult<Termination>;

    fn cable(&self, id: CableId) -> StorageResult<Cable>;

    /// Front port found at `position` of a rear port, if that position is populated.
    fn rear_port_mapping(
        &self,
        rear_port: TerminationId,
        position: u16,
    ) -> StorageResult<Option<Termination>>;

    /// Termination on the far side of a circuit termination's circuit.
    fn circuit_peer(&self, termination: TerminationId) -> StorageResult<Option<Termination>>;

    fn connection_cache(&self, id: TerminationId) -> StorageResult<ConnectionCache>;

    /// Ids of every endpoint of the given kind, in ascending order.
    fn endpoints_of_kind(&self, kind: EndpointKind) -> StorageResult<Vec<TerminationId>>;

    fn get_cable(&self, termination: &Termination) -> StorageResult<Option<Cable>> {
        match termination.cable {
            Some(id) => self.cable(id).map(Some),
            None => Ok(None),
        }
    }

    fn get_far_side(
        &self,
        cable: &Cable,
        termination: TerminationId,
    ) -> StorageResult<Option<Termination>> {
        match cable.far_side(termination) {
            Some(id) => self.termination(id).map(Some),
            None => Ok(None),
        }
    }

    /// Rear port and position a front port maps onto. `None` for anything but a front port.
    fn front_port_mapping(
        &self,
        front_port: &Termination,
    ) -> StorageResult<Option<(Termination, u16)>> {
        match front_port.role {
            Role::FrontPort {
                rear_port,
                rear_port_position,
            } => Ok(Some((self.termination(rear_port)?, rear_port_position))),
            _ => Ok(None),
        }
    }

    /// Number of positions a rear port exposes; zero for other terminations.
    fn positions_count(&self, rear_port: &Termination) -> u16 {
        match rear_port.role {
            Role::RearPort { positions } => positions,
            _ => 0,
        }
    }
}

/// Write side of the topology store.
pub trait TopologyStore: TopologyAccessor {
    /// Inserts or replaces a cable record, returning the previous one.
    fn upsert_cable(&mut self, cable: Cable) -> StorageResult<Option<Cable>>;

    fn remove_cable(&mut self, id: CableId) -> StorageResult<Cable>;

    /// Points a termination at its cable. Returns whether anything changed.
    fn set_termination_cable(
        &mut self,
        termination: TerminationId,
        cable: Option<CableId>,
    ) -> StorageResult<bool>;

    /// Writes a batch of cache updates atomically: either every update is
    /// applied or none is. Returns how many caches actually changed.
    fn persist(&mut self, updates: &[CacheUpdate]) -> StorageResult<usize>;
}

pub trait ConfigProvider: Send + Sync {
    fn topology_path(&self) -> &str;
    fn output_path(&self) -> Option<&str>;
    fn models(&self) -> &[String];
    fn verbosity(&self) -> u8;
    fn dry_run(&self) -> bool;
    fn monitor(&self) -> bool;
}
