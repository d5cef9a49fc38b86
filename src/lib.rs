pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::TomlConfig;
pub use core::{
    lab::LabEngine,
    runtime::{Runtime, RuntimeConfig},
};
pub use utils::error::{LabError, Result};
