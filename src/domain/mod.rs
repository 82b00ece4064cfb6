// Domain layer: topology model and the ports the engine is driven through.

pub mod kinds;
pub mod model;
pub mod ports;
