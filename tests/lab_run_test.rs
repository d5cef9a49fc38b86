use isolation_lab::app::{report, scenarios};
use isolation_lab::config::toml_config::TomlConfig;
use isolation_lab::domain::ports::ConfigProvider;
use isolation_lab::utils::validation::Validate;
use isolation_lab::{LabEngine, Runtime};
use std::io::Write;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

const FULL_CONFIG: &str = r#"
[lab]
name = "integration"

[runtime]
mailbox_capacity = 16

[scenarios]
concurrent_calls = 40

[repository]
fail_fetch = true

[[repository.items]]
id = 1
title = "alpha"

[[repository.items]]
id = 2
title = "beta"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_every_scenario_passes_from_config_file() {
    let file = write_config(FULL_CONFIG);
    let config = assert_ok!(TomlConfig::from_file(file.path()));
    assert_ok!(config.validate());

    let scenarios = assert_ok!(scenarios::build_scenarios(&config));
    assert_eq!(scenarios.len(), scenarios::KNOWN_SCENARIOS.len());

    let engine = LabEngine::new(Runtime::new(config.runtime_config()), scenarios);
    let lab_report = assert_ok!(engine.run().await);

    for scenario in &lab_report.scenarios {
        assert!(
            scenario.passed,
            "{} failed: {:?} {:?}",
            scenario.name, scenario.observations, scenario.error
        );
    }
    assert_ok!(report::ensure_passed(&lab_report));
    assert!(!lab_report.transfers.is_empty());

    let json = assert_ok!(report::render_json(&lab_report));
    assert!(json.contains("region-transfer"));
}

#[tokio::test]
async fn test_selected_scenarios_run_in_order() {
    let file = write_config(
        r#"
[lab]
name = "subset"

[scenarios]
enabled = ["task-inheritance", "sendable-boundary"]
"#,
    );
    let config = assert_ok!(TomlConfig::from_file(file.path()));

    let engine = LabEngine::new(
        Runtime::new(config.runtime_config()),
        assert_ok!(scenarios::build_scenarios(&config)),
    );
    assert_eq!(
        engine.scenario_names(),
        vec!["task-inheritance", "sendable-boundary"]
    );

    let lab_report = assert_ok!(engine.run().await);
    assert!(lab_report.passed());
}

#[test]
fn test_unknown_scenario_is_rejected() {
    let file = write_config(
        r#"
[lab]
name = "typo"

[scenarios]
enabled = ["actor-serialisation"]
"#,
    );
    let config = assert_ok!(TomlConfig::from_file(file.path()));

    assert_err!(config.validate());
    assert!(scenarios::build_scenarios(&config).is_err());
}

#[test]
fn test_missing_config_file() {
    assert_err!(TomlConfig::from_file("/nonexistent/lab-config.toml"));
}
