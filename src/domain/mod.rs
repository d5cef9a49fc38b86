// Domain layer: models and ports shared by the core engine, adapters and scenarios.

pub mod model;
pub mod ports;
