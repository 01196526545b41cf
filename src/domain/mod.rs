// Domain layer: data model and the ports (randomness, time, delay, config) the core depends on.

pub mod model;
pub mod ports;
