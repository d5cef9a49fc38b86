pub mod actor_serialization;
pub mod list_view;
pub mod region_transfer;
pub mod sendable_boundary;
pub mod task_inheritance;

use crate::domain::ports::{ConfigProvider, Scenario};
use crate::utils::error::Result;
use crate::utils::validation::validate_scenario_names;

pub use actor_serialization::ActorSerializationScenario;
pub use list_view::ListViewScenario;
pub use region_transfer::RegionTransferScenario;
pub use sendable_boundary::SendableBoundaryScenario;
pub use task_inheritance::TaskInheritanceScenario;

pub const ACTOR_SERIALIZATION: &str = "actor-serialization";
pub const SENDABLE_BOUNDARY: &str = "sendable-boundary";
pub const REGION_TRANSFER: &str = "region-transfer";
pub const TASK_INHERITANCE: &str = "task-inheritance";
pub const LIST_VIEW: &str = "list-view";

pub const KNOWN_SCENARIOS: [&str; 5] = [
    ACTOR_SERIALIZATION,
    SENDABLE_BOUNDARY,
    REGION_TRANSFER,
    TASK_INHERITANCE,
    LIST_VIEW,
];

/// Builds the configured scenarios in the order given. An empty selection
/// means all of them.
pub fn build_scenarios<C: ConfigProvider + ?Sized>(config: &C) -> Result<Vec<Box<dyn Scenario>>> {
    let mut names = config.scenarios();
    if names.is_empty() {
        names = KNOWN_SCENARIOS.iter().map(|s| s.to_string()).collect();
    }
    validate_scenario_names("scenarios", &names, &KNOWN_SCENARIOS)?;

    let scenarios = names
        .iter()
        .map(|name| -> Box<dyn Scenario> {
            match name.as_str() {
                ACTOR_SERIALIZATION => {
                    Box::new(ActorSerializationScenario::new(config.concurrent_calls()))
                }
                SENDABLE_BOUNDARY => Box::new(SendableBoundaryScenario),
                REGION_TRANSFER => Box::new(RegionTransferScenario),
                TASK_INHERITANCE => Box::new(TaskInheritanceScenario),
                // LIST_VIEW; names were validated above
                _ => Box::new(ListViewScenario::new(config.seed_items(), config.fail_fetch())),
            }
        })
        .collect();

    Ok(scenarios)
}
