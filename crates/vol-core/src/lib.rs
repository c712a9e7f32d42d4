//! SAN Volume Core
//!
//! Core types, error taxonomy and the provider-location codec shared by the
//! volume provisioning driver.

pub mod config;
pub mod error;
pub mod location;
pub mod types;

pub use config::{AccessPattern, NamingStrategy, VolumeDriverConfig};
pub use error::{ExecutionError, StorageError, ValidationError};
pub use location::ProviderLocation;
pub use types::*;

/// Result type for volume provisioning operations
pub type Result<T> = std::result::Result<T, StorageError>;
