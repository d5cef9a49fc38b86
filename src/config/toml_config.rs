use crate::app::scenarios::KNOWN_SCENARIOS;
use crate::config::MAX_CONCURRENT_CALLS;
use crate::core::runtime::RuntimeConfig;
use crate::domain::model::Item;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LabError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_scenario_names, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub lab: LabConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub scenarios: ScenariosConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenariosConfig {
    #[serde(default)]
    pub enabled: Vec<String>,
    pub concurrent_calls: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub fail_fetch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LabError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LabError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LAB_CALLS})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LabError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn json_logging(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json)
            .unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn runtime_config(&self) -> RuntimeConfig {
        self.runtime.clone()
    }

    fn scenarios(&self) -> Vec<String> {
        self.scenarios.enabled.clone()
    }

    fn concurrent_calls(&self) -> usize {
        self.scenarios.concurrent_calls.unwrap_or(32)
    }

    fn seed_items(&self) -> Vec<Item> {
        self.repository.items.clone()
    }

    fn fail_fetch(&self) -> bool {
        self.repository.fail_fetch
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("lab.name", &self.lab.name)?;
        self.runtime.validate()?;
        validate_scenario_names("scenarios.enabled", &self.scenarios.enabled, &KNOWN_SCENARIOS)?;
        if let Some(calls) = self.scenarios.concurrent_calls {
            validate_range("scenarios.concurrent_calls", calls, 1, MAX_CONCURRENT_CALLS)?;
        }

        let mut ids = HashSet::new();
        for item in &self.repository.items {
            validate_non_empty_string("repository.items.title", &item.title)?;
            if !ids.insert(item.id) {
                return Err(LabError::InvalidConfigValueError {
                    field: "repository.items.id".to_string(),
                    value: item.id.to_string(),
                    reason: "Duplicate item id".to_string(),
                });
            }
        }

        if let Some(level) = self.log_level() {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(LabError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }
}
