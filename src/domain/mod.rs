// Domain layer: models and ports. Nothing in here performs I/O.

pub mod model;
pub mod ports;
