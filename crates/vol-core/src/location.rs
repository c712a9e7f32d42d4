//! Provider-location codec
//!
//! The provider location is the opaque string callers persist for an
//! exported volume. It carries everything a later operation needs to reach
//! the volume again: portal address and port, LUN index and target name,
//! rendered as `"<addr>:<port>,<lun> <target>"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Decoded provider location for an exported volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLocation {
    /// Portal address of the appliance data path
    pub portal_address: String,
    /// Portal TCP port
    pub portal_port: u16,
    /// LUN index inside the target
    pub lun: u32,
    /// Appliance-side target name
    pub target: String,
}

impl ProviderLocation {
    pub fn new(portal_address: impl Into<String>, portal_port: u16, lun: u32, target: impl Into<String>) -> Self {
        Self {
            portal_address: portal_address.into(),
            portal_port,
            lun,
            target: target.into(),
        }
    }

    /// Target name segment of the location
    pub fn target_name(&self) -> &str {
        &self.target
    }

    /// Portal in `addr:port` form, as block-transport clients expect it
    pub fn portal(&self) -> String {
        format!("{}:{}", self.portal_address, self.portal_port)
    }
}

impl fmt::Display for ProviderLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{} {}",
            self.portal_address, self.portal_port, self.lun, self.target
        )
    }
}

impl FromStr for ProviderLocation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ValidationError::MalformedLocation {
            location: s.to_string(),
            reason: reason.to_string(),
        };

        let (endpoint, target) = s
            .split_once(' ')
            .ok_or_else(|| malformed("missing target name segment"))?;
        if target.is_empty() || target.contains(' ') {
            return Err(malformed("invalid target name segment"));
        }

        let (portal, lun) = endpoint
            .split_once(',')
            .ok_or_else(|| malformed("missing LUN index"))?;
        let lun = lun
            .parse::<u32>()
            .map_err(|_| malformed("LUN index is not an integer"))?;

        let (address, port) = portal
            .rsplit_once(':')
            .ok_or_else(|| malformed("missing portal port"))?;
        if address.is_empty() {
            return Err(malformed("missing portal address"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| malformed("portal port is not an integer"))?;

        Ok(ProviderLocation {
            portal_address: address.to_string(),
            portal_port: port,
            lun,
            target: target.to_string(),
        })
    }
}
