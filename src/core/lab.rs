use crate::core::runtime::Runtime;
use crate::domain::model::{LabReport, ScenarioReport};
use crate::domain::ports::Scenario;
use crate::utils::error::{LabError, Result};
use chrono::Utc;
use std::time::Instant;

pub struct LabEngine {
    runtime: Runtime,
    scenarios: Vec<Box<dyn Scenario>>,
}

impl LabEngine {
    pub fn new(runtime: Runtime, scenarios: Vec<Box<dyn Scenario>>) -> Self {
        Self { runtime, scenarios }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn scenario_names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name()).collect()
    }

    /// 依序執行所有實驗；單一實驗失敗不會中斷其他實驗
    pub async fn run(&self) -> Result<LabReport> {
        if self.scenarios.is_empty() {
            return Err(LabError::MissingConfigError {
                field: "scenarios".to_string(),
            });
        }

        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(self.scenarios.len());
        tracing::info!("🔬 Running {} isolation scenario(s)", self.scenarios.len());

        for scenario in &self.scenarios {
            tracing::info!("🧪 {}: {}", scenario.name(), scenario.description());
            let start = Instant::now();
            let result = scenario.run(&self.runtime).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let report = match result {
                Ok(outcome) => ScenarioReport {
                    name: scenario.name().to_string(),
                    passed: outcome.passed,
                    observations: outcome.observations,
                    duration_ms,
                    error: None,
                },
                Err(e) => {
                    tracing::error!("❌ {} aborted: {}", scenario.name(), e);
                    ScenarioReport {
                        name: scenario.name().to_string(),
                        passed: false,
                        observations: Vec::new(),
                        duration_ms,
                        error: Some(e.to_string()),
                    }
                }
            };

            for note in &report.observations {
                tracing::debug!("   {}", note);
            }
            if report.passed {
                tracing::info!("✅ {} passed in {}ms", report.name, report.duration_ms);
            } else {
                tracing::warn!("⚠️ {} failed in {}ms", report.name, report.duration_ms);
            }
            reports.push(report);
        }

        Ok(LabReport {
            started_at,
            scenarios: reports,
            transfers: self.runtime.transfer_log().records(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runtime::RuntimeConfig;
    use crate::domain::model::ScenarioOutcome;

    struct Fixed {
        name: String,
        passes: bool,
        errors: bool,
    }

    #[async_trait::async_trait(?Send)]
    impl Scenario for Fixed {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "fixed outcome"
        }

        async fn run(&self, _runtime: &Runtime) -> Result<ScenarioOutcome> {
            if self.errors {
                return Err(LabError::ScenarioFailed {
                    scenario: self.name.clone(),
                    message: "boom".to_string(),
                });
            }
            let mut outcome = ScenarioOutcome::new();
            outcome.check(self.passes, "fixed check");
            Ok(outcome)
        }
    }

    fn fixed(name: &str, passes: bool, errors: bool) -> Box<dyn Scenario> {
        Box::new(Fixed {
            name: name.to_string(),
            passes,
            errors,
        })
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let engine = LabEngine::new(
            Runtime::new(RuntimeConfig::default()),
            vec![fixed("a", true, false), fixed("b", false, false), fixed("c", true, true)],
        );

        let report = engine.run().await.unwrap();
        assert_eq!(report.scenarios.len(), 3);
        assert!(!report.passed());
        assert_eq!(report.failed().len(), 2);
        assert_eq!(report.scenarios[2].error.as_deref(), Some("Scenario 'c' failed: boom"));
    }

    #[tokio::test]
    async fn test_empty_engine_is_a_config_error() {
        let engine = LabEngine::new(Runtime::new(RuntimeConfig::default()), Vec::new());
        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, LabError::MissingConfigError { .. }));
    }
}
