// Domain layer: row/result models and the transport port. No HTTP or rendering here.

pub mod model;
pub mod ports;
