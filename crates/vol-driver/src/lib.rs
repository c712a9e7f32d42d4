//! SAN Volume Driver
//!
//! Provisions block-storage volumes on a remote appliance that exposes only
//! a restricted management CLI, and exports them over iSCSI. The driver
//! maps volume and snapshot identifiers onto appliance target/LUN names,
//! issues the ordered command sequences for each lifecycle operation, and
//! keeps the appliance namespace consistent with the caller's identifiers.

pub mod command;
pub mod driver;
pub mod executor;
pub mod locks;
pub mod naming;
pub mod session;

#[cfg(test)]
mod tests;

pub use command::{CloneType, CommandBuilder, TargetAcl};
pub use driver::SanVolumeDriver;
pub use executor::{CommandExecutor, LocalExecutor, SshEndpoint, SshExecutor};
pub use locks::TargetLockMap;
pub use naming::{LunRef, TargetNameResolver, FIXED_LUN_INDEX};
pub use session::{BlockTransportSession, IscsiSessionBuilder};
