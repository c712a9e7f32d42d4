//! Driver configuration surface
//!
//! All behavior-affecting options are carried on an explicit configuration
//! object handed to the driver at construction time. None of them change
//! lifecycle ordering; they only shape command construction and naming.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// LUN access pattern hint passed to the appliance
///
/// Always stated explicitly on lun-create; the appliance-side default is
/// not trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessPattern {
    #[default]
    Random,
    Concurrency,
    Streaming,
}

impl std::fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessPattern::Random => write!(f, "random"),
            AccessPattern::Concurrency => write!(f, "concurrency"),
            AccessPattern::Streaming => write!(f, "streaming"),
        }
    }
}

/// How caller identifiers map onto appliance target names
///
/// Chosen once per deployment; the resolver applies the same strategy to
/// every operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingStrategy {
    /// Target is `<prefix><identifier>`, one LUN per target at index 1
    #[default]
    Prefixed,
    /// Caller supplies `<target>:<lun>` identifiers up front
    Composite,
}

/// Configuration for the volume provisioning driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeDriverConfig {
    /// Appliance data-path address exported volumes are reached through
    pub portal_address: String,
    /// Portal TCP port
    #[serde(default = "default_portal_port")]
    pub portal_port: u16,
    /// Management CLI entry point on the appliance
    #[serde(default = "default_cli_command")]
    pub cli_command: String,
    /// Prefix prepended to identifiers when deriving target names
    #[serde(default)]
    pub target_prefix: String,
    /// Thin provisioning for new LUNs (appliance default: enabled)
    #[serde(default = "default_enabled")]
    pub thin_provisioning: bool,
    /// LUN file caching (appliance default: enabled)
    #[serde(default = "default_enabled")]
    pub smart_cache: bool,
    /// Create LUNs read-only (appliance default: disabled)
    #[serde(default)]
    pub read_only: bool,
    /// Access pattern stated on every lun-create
    #[serde(default)]
    pub access_pattern: AccessPattern,
    /// Delete targets without appliance-side acknowledgment
    #[serde(default = "default_enabled")]
    pub force_target_delete: bool,
    /// Identifier-to-target naming strategy
    #[serde(default)]
    pub naming: NamingStrategy,
}

fn default_portal_port() -> u16 {
    3260
}

fn default_cli_command() -> String {
    "sancli".to_string()
}

fn default_enabled() -> bool {
    true
}

impl VolumeDriverConfig {
    /// Configuration with appliance defaults for everything but the portal
    pub fn new(portal_address: impl Into<String>) -> Self {
        Self {
            portal_address: portal_address.into(),
            portal_port: default_portal_port(),
            cli_command: default_cli_command(),
            target_prefix: String::new(),
            thin_provisioning: true,
            smart_cache: true,
            read_only: false,
            access_pattern: AccessPattern::default(),
            force_target_delete: true,
            naming: NamingStrategy::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
