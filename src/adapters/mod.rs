// Adapters layer: concrete topology stores behind the domain ports.

pub mod json_file;
pub mod memory;

pub use json_file::{JsonTopologyFile, TopologyDocument};
pub use memory::InMemoryTopology;
