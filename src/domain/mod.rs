// Domain layer: archive/compression model and the ports implemented by the core.

pub mod model;
pub mod ports;
