use crate::core::transfer::TransferRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub title: String,
}

/// 單一實驗的觀察結果
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub passed: bool,
    pub observations: Vec<String>,
}

impl ScenarioOutcome {
    pub fn new() -> Self {
        Self {
            passed: true,
            observations: Vec::new(),
        }
    }

    pub fn observe(&mut self, note: impl Into<String>) {
        self.observations.push(note.into());
    }

    /// Records an expectation. A single failed check fails the scenario.
    pub fn check(&mut self, holds: bool, description: impl Into<String>) {
        let description = description.into();
        if holds {
            self.observations.push(format!("✅ {}", description));
        } else {
            self.passed = false;
            self.observations.push(format!("❌ {}", description));
        }
    }
}

impl Default for ScenarioOutcome {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub observations: Vec<String>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabReport {
    pub started_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
    pub transfers: Vec<TransferRecord>,
}

impl LabReport {
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.passed)
    }

    pub fn failed(&self) -> Vec<&ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.passed).collect()
    }
}
