//! SAN Network Lease
//!
//! DHCP lease issuance on hypervisor hosts: a thin lease driver delegating
//! to OS-level network tooling. Shares nothing with the volume provisioning
//! core.

pub mod driver;
pub mod tool;
pub mod types;


pub use driver::{LeaseDriver, LinuxNetLeaseDriver};
pub use tool::{DhcpReleaseTool, NetworkTool};
pub use types::{LeaseDriverConfig, NetworkRef, Vif};
