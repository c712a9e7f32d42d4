//! Network and interface records handled by the lease driver

use ipnet::IpNet;
use mac_address::MacAddress;
use serde::{Deserialize, Serialize};

/// A provisioned tenant network on a hypervisor host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRef {
    /// Network identifier
    pub id: String,
    /// Bridge device the DHCP service listens on
    pub bridge: String,
    /// IPv4 subnet leases are issued from
    pub cidr: IpNet,
    /// IPv6 subnet, when the network is dual-stack
    pub cidr_v6: Option<IpNet>,
}

/// A virtual interface attached to a guest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vif {
    pub id: String,
    pub mac: MacAddress,
}

/// Lease driver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaseDriverConfig {
    /// Force a lease release on interface removal so the release callback
    /// fires immediately instead of waiting for lease expiry
    #[serde(default)]
    pub force_lease_release: bool,
    /// Announce router advertisements for dual-stack networks
    #[serde(default)]
    pub enable_ipv6: bool,
}
