//! OS network tool boundary
//!
//! The lease driver owns no DHCP logic of its own; it delegates to the
//! host's network tooling through this trait.

use std::net::IpAddr;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use mac_address::MacAddress;
use tokio::process::Command;

use crate::types::NetworkRef;

/// Host-side network tooling the lease driver delegates to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkTool: Send + Sync {
    /// Device the network's DHCP service is bound to
    fn device_for(&self, network: &NetworkRef) -> String;

    /// Push the network's current lease ranges to the DHCP service
    async fn update_dhcp(&self, dev: &str, network: &NetworkRef) -> Result<()>;

    /// Push router-advertisement configuration for a dual-stack network
    async fn update_ra(&self, dev: &str, network: &NetworkRef) -> Result<()>;

    /// Force-release one lease so the release callback fires immediately
    async fn release_lease(&self, dev: &str, ip: IpAddr, mac: &MacAddress) -> Result<()>;
}

async fn run(program: &str, args: &[String]) -> Result<()> {
    let rendered = format!("{} {}", program, args.join(" "));
    debug!("Executing {rendered}");

    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("failed to spawn {rendered}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{rendered} failed with exit code {:?}: {}",
            output.status.code(),
            stderr.trim()
        );
    }
    Ok(())
}

/// Default tool: dnsmasq service units per bridge, `dhcp_release` from
/// dnsmasq-utils for forced releases, radvd for router advertisements
#[derive(Debug, Clone)]
pub struct DhcpReleaseTool {
    systemctl_path: String,
    dhcp_release_path: String,
}

impl DhcpReleaseTool {
    pub fn new() -> Self {
        Self {
            systemctl_path: "systemctl".to_string(),
            dhcp_release_path: "dhcp_release".to_string(),
        }
    }

    pub fn with_paths(systemctl_path: String, dhcp_release_path: String) -> Self {
        Self {
            systemctl_path,
            dhcp_release_path,
        }
    }
}

impl Default for DhcpReleaseTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkTool for DhcpReleaseTool {
    fn device_for(&self, network: &NetworkRef) -> String {
        network.bridge.clone()
    }

    async fn update_dhcp(&self, dev: &str, _network: &NetworkRef) -> Result<()> {
        run(
            &self.systemctl_path,
            &[
                "reload-or-restart".to_string(),
                format!("dnsmasq@{dev}.service"),
            ],
        )
        .await
    }

    async fn update_ra(&self, dev: &str, _network: &NetworkRef) -> Result<()> {
        run(
            &self.systemctl_path,
            &[
                "reload-or-restart".to_string(),
                format!("radvd@{dev}.service"),
            ],
        )
        .await
    }

    async fn release_lease(&self, dev: &str, ip: IpAddr, mac: &MacAddress) -> Result<()> {
        run(
            &self.dhcp_release_path,
            &[dev.to_string(), ip.to_string(), mac.to_string()],
        )
        .await
    }
}
