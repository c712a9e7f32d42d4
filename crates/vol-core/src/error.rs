//! Error types for volume provisioning operations

use thiserror::Error;

/// Main error type for volume provisioning operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Input validation errors, raised before any appliance call
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid volume size {size} GiB: {reason}")]
    InvalidSize { size: u64, reason: String },

    #[error("Identifier {identifier} is missing the target:lun delimiter")]
    MissingDelimiter { identifier: String },

    #[error("Invalid LUN index in identifier {identifier}")]
    InvalidLunIndex { identifier: String },

    #[error("Connector for volume {volume} carries no initiator name")]
    MissingInitiator { volume: String },

    #[error("Malformed provider location {location}: {reason}")]
    MalformedLocation { location: String, reason: String },
}

/// Appliance command failures reported by the command executor
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Command {command} failed: {output}")]
    CommandFailed { command: String, output: String },

    #[error("Command {command} could not be spawned: {reason}")]
    Spawn { command: String, reason: String },
}

impl ExecutionError {
    /// Whether the appliance diagnostic reports the resource as already
    /// present. This is the single conflict creation paths may swallow.
    pub fn is_already_exists(&self) -> bool {
        match self {
            ExecutionError::CommandFailed { output, .. } => {
                output.to_ascii_lowercase().contains("already exist")
            }
            ExecutionError::Spawn { .. } => false,
        }
    }
}

impl StorageError {
    /// See [`ExecutionError::is_already_exists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StorageError::Execution(e) if e.is_already_exists())
    }
}
