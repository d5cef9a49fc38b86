use crate::utils::error::{LabError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_scenario_names(field_name: &str, names: &[String], known: &[&str]) -> Result<()> {
    let known_set: HashSet<&str> = known.iter().copied().collect();
    let mut seen = HashSet::new();

    for name in names {
        if !known_set.contains(name.as_str()) {
            return Err(LabError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.clone(),
                reason: format!("Unknown scenario. Known scenarios: {}", known.join(", ")),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(LabError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: name.clone(),
                reason: "Scenario listed more than once".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("mailbox_capacity", 5, 1).is_ok());
        assert!(validate_positive_number("mailbox_capacity", 0, 1).is_err());
    }

    #[test]
    fn test_validate_scenario_names() {
        let known = ["actor-serialization", "list-view"];
        let names = vec!["list-view".to_string()];
        assert!(validate_scenario_names("scenarios", &names, &known).is_ok());

        let unknown = vec!["teleport".to_string()];
        assert!(validate_scenario_names("scenarios", &unknown, &known).is_err());

        let duplicated = vec!["list-view".to_string(), "list-view".to_string()];
        assert!(validate_scenario_names("scenarios", &duplicated, &known).is_err());
    }

    #[test]
    fn test_validate_range_and_strings() {
        assert!(validate_range("concurrent_calls", 32, 1, 10_000).is_ok());
        assert!(validate_range("concurrent_calls", 0, 1, 10_000).is_err());
        assert!(validate_non_empty_string("title", "  ").is_err());
    }
}
