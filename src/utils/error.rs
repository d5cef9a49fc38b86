use crate::core::domain::DomainId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Isolation violation: value owned by {owner} accessed from {accessor}")]
    IsolationViolation { owner: DomainId, accessor: DomainId },

    #[error("Transfer rejected: {reason}")]
    TransferRejected { reason: String },

    #[error("Mailbox of {actor} is closed")]
    MailboxClosed { actor: String },

    #[error("Token for {domain} used after that domain exited")]
    DomainExited { domain: DomainId },

    #[error("Main domain is already active in this runtime")]
    MainAlreadyActive,

    #[error("Reentrant call into {domain} from its own mailbox")]
    ReentrantCall { domain: DomainId },

    #[error("Isolated state poisoned in {domain}")]
    PoisonedState { domain: DomainId },

    #[error("Task failed: {message}")]
    TaskFailed { message: String },

    #[error("Repository error: {message}")]
    RepositoryError { message: String },

    #[error("Scenario '{scenario}' failed: {message}")]
    ScenarioFailed { scenario: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Isolation,
    Runtime,
    Io,
    Scenario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LabError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LabError::ConfigError { .. }
            | LabError::ConfigValidationError { .. }
            | LabError::InvalidConfigValueError { .. }
            | LabError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LabError::IsolationViolation { .. }
            | LabError::TransferRejected { .. }
            | LabError::DomainExited { .. }
            | LabError::ReentrantCall { .. } => ErrorCategory::Isolation,
            LabError::MailboxClosed { .. }
            | LabError::MainAlreadyActive
            | LabError::PoisonedState { .. }
            | LabError::TaskFailed { .. } => ErrorCategory::Runtime,
            LabError::IoError(_) | LabError::SerializationError(_) => ErrorCategory::Io,
            LabError::RepositoryError { .. } | LabError::ScenarioFailed { .. } => {
                ErrorCategory::Scenario
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 預期中的隔離拒絕，屬於模型的正常行為
            LabError::IsolationViolation { .. } | LabError::TransferRejected { .. } => {
                ErrorSeverity::Low
            }
            LabError::RepositoryError { .. } | LabError::MailboxClosed { .. } => {
                ErrorSeverity::Medium
            }
            LabError::ConfigError { .. }
            | LabError::ConfigValidationError { .. }
            | LabError::InvalidConfigValueError { .. }
            | LabError::MissingConfigError { .. }
            | LabError::ScenarioFailed { .. }
            | LabError::DomainExited { .. }
            | LabError::MainAlreadyActive
            | LabError::ReentrantCall { .. } => ErrorSeverity::High,
            LabError::IoError(_)
            | LabError::SerializationError(_)
            | LabError::PoisonedState { .. }
            | LabError::TaskFailed { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            LabError::ConfigError { .. } | LabError::ConfigValidationError { .. } => {
                "Check the configuration file syntax and field names".to_string()
            }
            LabError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' and run again", field)
            }
            LabError::MissingConfigError { field } => {
                format!("Add the required field '{}'", field)
            }
            LabError::IsolationViolation { owner, .. } => {
                format!("Access the value from {} or transfer it explicitly", owner)
            }
            LabError::TransferRejected { .. } => {
                "Drop every alias of the value before transferring it".to_string()
            }
            LabError::MailboxClosed { .. } => {
                "Keep an ActorRef alive for as long as the actor is needed".to_string()
            }
            LabError::ReentrantCall { .. } => {
                "Mutate the actor state directly instead of messaging yourself".to_string()
            }
            LabError::DomainExited { domain } => {
                format!("Only use tokens for {} inside the domain that issued them", domain)
            }
            LabError::MainAlreadyActive => {
                "Hop onto the running main domain through its MainHandle".to_string()
            }
            LabError::RepositoryError { .. } => "Retry the fetch".to_string(),
            LabError::ScenarioFailed { .. } => {
                "Run with --verbose to see the scenario observations".to_string()
            }
            LabError::IoError(_) => "Check file paths and permissions".to_string(),
            LabError::SerializationError(_) => "Check the report data".to_string(),
            LabError::PoisonedState { .. } | LabError::TaskFailed { .. } => {
                "A task panicked; inspect the logs above".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("配置錯誤: {}", self),
            ErrorCategory::Isolation => format!("隔離規則拒絕: {}", self),
            ErrorCategory::Runtime => format!("執行期錯誤: {}", self),
            ErrorCategory::Io => format!("IO 錯誤: {}", self),
            ErrorCategory::Scenario => format!("實驗失敗: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_errors_are_low_severity() {
        let err = LabError::IsolationViolation {
            owner: DomainId::Main,
            accessor: DomainId::Nonisolated,
        };
        assert_eq!(err.category(), ErrorCategory::Isolation);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(
            err.to_string(),
            "Isolation violation: value owned by main accessed from nonisolated"
        );
    }

    #[test]
    fn test_config_errors_suggest_field() {
        let err = LabError::InvalidConfigValueError {
            field: "mailbox_capacity".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("mailbox_capacity"));
    }

    #[test]
    fn test_misused_tokens_are_high_severity() {
        let err = LabError::DomainExited {
            domain: DomainId::Main,
        };
        assert_eq!(err.category(), ErrorCategory::Isolation);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(LabError::MainAlreadyActive.category(), ErrorCategory::Runtime);
    }
}
