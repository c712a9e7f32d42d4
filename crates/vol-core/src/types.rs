//! Core entity types shared across the provisioning driver

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::location::ProviderLocation;

/// A caller-visible block device request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    /// Caller-side identifier, unique within the deployment
    pub name: String,
    /// Requested size in GiB
    pub size_gib: u64,
    /// Export location, attached once the volume has been exported
    pub provider_location: Option<ProviderLocation>,
}

impl Volume {
    pub fn new(name: impl Into<String>, size_gib: u64) -> Self {
        Self {
            name: name.into(),
            size_gib,
            provider_location: None,
        }
    }
}

/// A point-in-time clone source taken from an existing volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Caller-side snapshot identifier
    pub name: String,
    /// Identifier of the parent volume
    pub volume_name: String,
}

impl Snapshot {
    pub fn new(name: impl Into<String>, volume_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            volume_name: volume_name.into(),
        }
    }
}

/// Identity a compute host presents when attaching a volume
///
/// Detach paths must tolerate partially populated connectors; the appliance
/// identifies the target by name, not by the connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Connector {
    /// Initiator name of the connecting host
    pub initiator: Option<String>,
    /// Address of the connecting host
    pub ip: Option<IpAddr>,
}

impl Connector {
    pub fn with_initiator(initiator: impl Into<String>) -> Self {
        Self {
            initiator: Some(initiator.into()),
            ip: None,
        }
    }
}

/// Block transport used to reach an exported volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Iscsi,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Iscsi => write!(f, "iscsi"),
        }
    }
}

/// Connection details handed back to the caller after attach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub transport: TransportKind,
    /// Portal in `addr:port` form
    pub portal: String,
    /// Target the initiator has been granted access to
    pub target: String,
    /// LUN index to address inside the target
    pub lun: u32,
}
