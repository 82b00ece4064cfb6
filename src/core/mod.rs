pub mod engine;
pub mod plan;
pub mod report;
pub mod resolver;
pub mod status;
pub mod trace;

pub use crate::domain::model::{Cable, ConnectionCache, Termination, TerminationId};
pub use crate::domain::ports::{TopologyAccessor, TopologyStore};
pub use crate::utils::error::Result;
