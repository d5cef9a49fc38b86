pub mod toml_config;

#[cfg(feature = "cli")]
use crate::app::scenarios::KNOWN_SCENARIOS;
use crate::core::runtime::RuntimeConfig;
#[cfg(feature = "cli")]
use crate::domain::model::Item;
#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, Validate};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_range, validate_scenario_names};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const MAX_CONCURRENT_CALLS: usize = 10_000;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "isolation-lab")]
#[command(about = "Runs actor isolation and data-race safety experiments")]
pub struct CliConfig {
    #[arg(long, value_delimiter = ',', help = "Scenarios to run (default: all)")]
    pub scenarios: Vec<String>,

    #[arg(long, default_value = "32")]
    pub concurrent_calls: usize,

    #[arg(long, default_value = "64")]
    pub mailbox_capacity: usize,

    #[arg(long, default_value = "0", help = "Items the repository starts with")]
    pub seed_items: usize,

    #[arg(long, help = "Make the repository fail its first fetch")]
    pub fail_fetch: bool,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            mailbox_capacity: self.mailbox_capacity,
            ..RuntimeConfig::default()
        }
    }

    fn scenarios(&self) -> Vec<String> {
        self.scenarios.clone()
    }

    fn concurrent_calls(&self) -> usize {
        self.concurrent_calls
    }

    fn seed_items(&self) -> Vec<Item> {
        (1..=self.seed_items as u64)
            .map(|id| Item {
                id,
                title: format!("Item {}", id),
            })
            .collect()
    }

    fn fail_fetch(&self) -> bool {
        self.fail_fetch
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_scenario_names("scenarios", &self.scenarios, &KNOWN_SCENARIOS)?;
        validate_range("concurrent_calls", self.concurrent_calls, 1, MAX_CONCURRENT_CALLS)?;
        validate_positive_number("mailbox_capacity", self.mailbox_capacity, 1)?;
        Ok(())
    }
}

impl Validate for RuntimeConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("runtime.mailbox_capacity", self.mailbox_capacity, 1)?;
        validate_positive_number("runtime.main_queue_capacity", self.main_queue_capacity, 1)?;
        Ok(())
    }
}
