// Adapters layer: concrete stand-ins for the ports in `domain::ports`.

pub mod repository;
