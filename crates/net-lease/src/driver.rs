//! DHCP lease driver
//!
//! Thin delegation over the host's network tooling: the driver decides
//! *when* the DHCP service is refreshed and leases are released, the tool
//! decides *how*.

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info};

use crate::tool::NetworkTool;
use crate::types::{LeaseDriverConfig, NetworkRef, Vif};

/// Lease lifecycle operations invoked by the compute manager
#[async_trait]
pub trait LeaseDriver: Send + Sync {
    async fn init_network(&self, network: &NetworkRef) -> Result<()>;
    async fn teardown_network(&self, network: &NetworkRef) -> Result<()>;
    async fn add_interface(&self, network: &NetworkRef, ip: IpAddr, vif: &Vif) -> Result<()>;
    async fn remove_interface(
        &self,
        network: &NetworkRef,
        ip: IpAddr,
        vif: Option<&Vif>,
    ) -> Result<()>;
}

/// Lease driver backed by the host's Linux network tooling
pub struct LinuxNetLeaseDriver {
    tool: Arc<dyn NetworkTool>,
    config: LeaseDriverConfig,
}

impl LinuxNetLeaseDriver {
    pub fn new(tool: Arc<dyn NetworkTool>, config: LeaseDriverConfig) -> Self {
        Self { tool, config }
    }
}

#[async_trait]
impl LeaseDriver for LinuxNetLeaseDriver {
    async fn init_network(&self, network: &NetworkRef) -> Result<()> {
        info!("Initializing DHCP for network {}", network.id);

        let dev = self.tool.device_for(network);
        self.tool.update_dhcp(&dev, network).await?;
        if self.config.enable_ipv6 {
            self.tool.update_ra(&dev, network).await?;
        }
        Ok(())
    }

    async fn teardown_network(&self, network: &NetworkRef) -> Result<()> {
        info!("Tearing down DHCP for network {}", network.id);

        let dev = self.tool.device_for(network);
        self.tool.update_dhcp(&dev, network).await
    }

    /// Interfaces are picked up by the next `init_network` refresh; nothing
    /// to do per interface.
    async fn add_interface(&self, network: &NetworkRef, ip: IpAddr, vif: &Vif) -> Result<()> {
        debug!(
            "Interface {} ({ip}) added on network {}; covered by the DHCP refresh",
            vif.id, network.id
        );
        Ok(())
    }

    /// Release the interface's lease when forced release is configured.
    ///
    /// A missing VIF record should never happen, but a race on concurrent
    /// deallocation can produce one; it is logged so the race can be
    /// tracked down, and the removal still completes.
    async fn remove_interface(
        &self,
        network: &NetworkRef,
        ip: IpAddr,
        vif: Option<&Vif>,
    ) -> Result<()> {
        if !self.config.force_lease_release {
            return Ok(());
        }

        match vif {
            None => {
                error!("Unable to release {ip} on network {}: vif record missing", network.id);
                Ok(())
            }
            Some(vif) => {
                let dev = self.tool.device_for(network);
                // Forces a release packet so the release callback fires.
                self.tool.release_lease(&dev, ip, &vif.mac).await
            }
        }
    }
}
