use crate::core::runtime::{Runtime, RuntimeConfig};
use crate::domain::model::{Item, ScenarioOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Source of items for the list view. Implementations are shared across
/// domains, hence `Send + Sync`.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<Item>>;
}

pub trait ConfigProvider: Send + Sync {
    fn runtime_config(&self) -> RuntimeConfig;
    fn scenarios(&self) -> Vec<String>;
    fn concurrent_calls(&self) -> usize;
    fn seed_items(&self) -> Vec<Item>;
    fn fail_fetch(&self) -> bool;
}

/// One executable isolation experiment.
///
/// Not `Send`: a scenario may enter the main domain, which pins it to the
/// current thread.
#[async_trait(?Send)]
pub trait Scenario {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn run(&self, runtime: &Runtime) -> Result<ScenarioOutcome>;
}
