use crate::domain::model::{CableId, TerminationId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Termination {0} not found")]
    TerminationNotFound(TerminationId),

    #[error("Cable {0} not found")]
    CableNotFound(CableId),

    #[error("Termination {0} has no connected endpoint cache")]
    NoConnectionCache(TerminationId),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum CableTraceError {
    #[error("Cycle detected tracing from termination {start}: termination {revisited} reached twice")]
    CycleDetected {
        start: TerminationId,
        revisited: TerminationId,
    },

    #[error("Invalid position for rear port {rear_port} ({positions} positions): {position}")]
    InvalidPosition {
        rear_port: TerminationId,
        positions: u16,
        position: u16,
    },

    #[error("Invalid format: {name}. Models must be specified in the form app_label.ModelName.")]
    InvalidModelFormat { name: String },

    #[error("No installed app with label '{app_label}'.")]
    UnknownApp { app_label: String },

    #[error("Unknown model: {label}")]
    UnknownModel { label: String },

    #[error("Invalid model: {label} does not have a connected endpoint")]
    InvalidModel { label: String },

    #[error("Invalid cable {cable}: {reason}")]
    InvalidCable { cable: CableId, reason: String },

    #[error("Termination {termination} is already attached to cable {cable}")]
    TerminationOccupied {
        termination: TerminationId,
        cable: CableId,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid topology document: {message}")]
    InvalidDocument { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Background task failed: {message}")]
    TaskError { message: String },
}

pub type Result<T> = std::result::Result<T, CableTraceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Topology,
    Model,
    Storage,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CableTraceError {
    /// Errors caused by the topology data of a single termination. A batch
    /// run reports them and carries on with the next termination.
    pub fn is_topology_error(&self) -> bool {
        matches!(
            self,
            CableTraceError::CycleDetected { .. } | CableTraceError::InvalidPosition { .. }
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CableTraceError::CycleDetected { .. }
            | CableTraceError::InvalidPosition { .. }
            | CableTraceError::InvalidCable { .. }
            | CableTraceError::TerminationOccupied { .. } => ErrorCategory::Topology,
            CableTraceError::InvalidModelFormat { .. }
            | CableTraceError::UnknownApp { .. }
            | CableTraceError::UnknownModel { .. }
            | CableTraceError::InvalidModel { .. } => ErrorCategory::Model,
            CableTraceError::Storage(_)
            | CableTraceError::SerializationError(_)
            | CableTraceError::InvalidDocument { .. } => ErrorCategory::Storage,
            CableTraceError::ConfigError { .. }
            | CableTraceError::InvalidConfigValueError { .. }
            | CableTraceError::MissingConfigError { .. }
            | CableTraceError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            CableTraceError::IoError(_) | CableTraceError::TaskError { .. } => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Topology => ErrorSeverity::Medium,
            ErrorCategory::Model | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            CableTraceError::CycleDetected { revisited, .. } => format!(
                "Inspect the cables and port mappings around termination {}; physical paths cannot loop",
                revisited
            ),
            CableTraceError::InvalidPosition { rear_port, .. } => format!(
                "Check the front ports mapped onto rear port {}",
                rear_port
            ),
            CableTraceError::InvalidModelFormat { .. }
            | CableTraceError::UnknownApp { .. }
            | CableTraceError::UnknownModel { .. }
            | CableTraceError::InvalidModel { .. } => {
                "Use labels such as dcim.interface or circuits.circuittermination, or omit them to retrace every model".to_string()
            }
            CableTraceError::InvalidCable { .. } | CableTraceError::TerminationOccupied { .. } => {
                "Remove the existing cable first or pick two distinct, free terminations".to_string()
            }
            CableTraceError::Storage(_) => {
                "Verify the topology store is reachable and consistent".to_string()
            }
            CableTraceError::IoError(_) => "Check file paths and permissions".to_string(),
            CableTraceError::SerializationError(_) | CableTraceError::InvalidDocument { .. } => {
                "Make sure the topology document is valid JSON and every reference points at an existing termination".to_string()
            }
            CableTraceError::ConfigError { .. }
            | CableTraceError::InvalidConfigValueError { .. }
            | CableTraceError::MissingConfigError { .. }
            | CableTraceError::ConfigValidationError { .. } => {
                "Review the command line flags and the TOML configuration file".to_string()
            }
            CableTraceError::TaskError { .. } => "Re-run the command".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Topology => format!("Topology problem: {}", self),
            ErrorCategory::Model => format!("Cannot retrace: {}", self),
            ErrorCategory::Storage => format!("Topology store failed: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_errors_are_per_termination() {
        let cycle = CableTraceError::CycleDetected {
            start: TerminationId(1),
            revisited: TerminationId(2),
        };
        assert!(cycle.is_topology_error());
        assert_eq!(cycle.severity(), ErrorSeverity::Medium);

        let storage = CableTraceError::from(StorageError::CableNotFound(CableId(9)));
        assert!(!storage.is_topology_error());
        assert_eq!(storage.category(), ErrorCategory::Storage);
        assert_eq!(storage.to_string(), "Storage error: Cable 9 not found");
    }

    #[test]
    fn test_invalid_model_message() {
        let err = CableTraceError::InvalidModel {
            label: "dcim.frontport".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid model: dcim.frontport does not have a connected endpoint"
        );
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
