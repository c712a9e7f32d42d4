//! Provisioning command builder
//!
//! Pure construction of the management CLI argument lists. Nothing in this
//! module talks to the appliance, which keeps every command testable as
//! plain data.

use san_volume_core::{Result, ValidationError, VolumeDriverConfig};

use crate::naming::LunRef;

/// Appliance clone semantics
///
/// `Normal` produces an independent copy; `Snapshot` produces a
/// space-efficient copy that stays dependent on its source. The two are
/// never interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneType {
    Normal,
    Snapshot,
}

impl CloneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloneType::Normal => "normal",
            CloneType::Snapshot => "snapshot",
        }
    }
}

/// Desired ACL state for a target
///
/// The appliance ACL holds at most one initiator; it is always set or
/// cleared whole. `no` is the appliance sentinel for an empty ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAcl {
    Grant(String),
    Revoke,
}

/// Builds management CLI argument lists from volume attributes and
/// configuration
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    config: VolumeDriverConfig,
}

impl CommandBuilder {
    pub fn new(config: VolumeDriverConfig) -> Self {
        Self { config }
    }

    fn base(&self, noun: &str, verb: &str) -> Vec<String> {
        vec![
            self.config.cli_command.clone(),
            noun.to_string(),
            verb.to_string(),
        ]
    }

    /// `target create` for a new export unit, access-restricted from birth
    pub fn target_create(&self, target: &str) -> Vec<String> {
        let mut cmd = self.base("target", "create");
        cmd.push(format!("--name={target}"));
        cmd.push("--require-allow=true".to_string());
        cmd
    }

    /// `target delete`, valid only once the target holds no LUNs
    pub fn target_delete(&self, target: &str) -> Vec<String> {
        let mut cmd = self.base("target", "delete");
        cmd.push(format!("--name={target}"));
        if self.config.force_target_delete {
            cmd.push("--force".to_string());
        }
        cmd
    }

    /// `target modify` setting or clearing the single-initiator ACL
    pub fn target_modify(&self, target: &str, acl: &TargetAcl) -> Vec<String> {
        let mut cmd = self.base("target", "modify");
        cmd.push(format!("--name={target}"));
        match acl {
            TargetAcl::Grant(initiator) => {
                cmd.push(format!("--initiator={initiator}"));
                cmd.push("--require-allow=true".to_string());
            }
            TargetAcl::Revoke => {
                cmd.push("--initiator=no".to_string());
                cmd.push("--require-allow=false".to_string());
            }
        }
        cmd
    }

    /// `lun create` sized in integer gigabytes.
    ///
    /// Optional flags are appended only when they deviate from the
    /// appliance defaults (thin and smart-cache enabled, read-only off);
    /// the access pattern is always explicit.
    pub fn lun_create(&self, lun: &LunRef, size_gib: u64) -> Result<Vec<String>> {
        if size_gib == 0 {
            return Err(ValidationError::InvalidSize {
                size: size_gib,
                reason: "size must be a non-zero number of GiB".to_string(),
            }
            .into());
        }

        let mut cmd = self.base("lun", "create");
        cmd.push(format!("--name={}", lun.lun_name()));
        cmd.push(format!("--size={size_gib}G"));
        if !self.config.smart_cache {
            cmd.push("--smart-cache=false".to_string());
        }
        if self.config.read_only {
            cmd.push("--read-only=true".to_string());
        }
        if !self.config.thin_provisioning {
            cmd.push("--thin=false".to_string());
        }
        cmd.push(format!("--access-pattern={}", self.config.access_pattern));
        Ok(cmd)
    }

    /// `lun clone` from `source` into `clone` with explicit semantics
    pub fn lun_clone(&self, source: &LunRef, clone: &LunRef, kind: CloneType) -> Vec<String> {
        let mut cmd = self.base("lun", "clone");
        cmd.push(format!("--name={}", source.lun_name()));
        cmd.push(format!("--clone={}", clone.lun_name()));
        cmd.push(format!("--type={}", kind.as_str()));
        cmd
    }

    /// `lun delete` for one LUN, leaving the target in place
    pub fn lun_delete(&self, lun: &LunRef) -> Vec<String> {
        let mut cmd = self.base("lun", "delete");
        cmd.push(format!("--name={}", lun.lun_name()));
        cmd
    }

    /// `lun list` for the empty-target check, one LUN name per output line
    pub fn lun_list(&self, target: &str) -> Vec<String> {
        let mut cmd = self.base("lun", "list");
        cmd.push(format!("--target={target}"));
        cmd
    }
}
