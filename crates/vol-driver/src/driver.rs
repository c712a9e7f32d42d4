//! Volume provisioning lifecycle coordinator
//!
//! Orchestrates the ordered command sequences for volume and snapshot
//! lifecycle against the appliance management CLI. Creation paths are
//! idempotent only with respect to the appliance's "already exists"
//! diagnostic; deletion paths are deliberately not idempotent, so a caller
//! double-freeing a resource hears about it.

use std::sync::Arc;

use log::{debug, error, info};

use san_volume_core::{
    ConnectionInfo, Connector, ProviderLocation, Result, Snapshot, ValidationError, Volume,
    VolumeDriverConfig,
};

use crate::command::{CloneType, CommandBuilder, TargetAcl};
use crate::executor::CommandExecutor;
use crate::locks::TargetLockMap;
use crate::naming::{LunRef, TargetNameResolver};
use crate::session::{BlockTransportSession, IscsiSessionBuilder};

/// Volume provisioning driver for a single appliance endpoint
pub struct SanVolumeDriver {
    config: VolumeDriverConfig,
    resolver: TargetNameResolver,
    commands: CommandBuilder,
    executor: Arc<dyn CommandExecutor>,
    session: Arc<dyn BlockTransportSession>,
    locks: TargetLockMap,
}

impl SanVolumeDriver {
    pub fn new(config: VolumeDriverConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self::with_session(config, executor, Arc::new(IscsiSessionBuilder))
    }

    pub fn with_session(
        config: VolumeDriverConfig,
        executor: Arc<dyn CommandExecutor>,
        session: Arc<dyn BlockTransportSession>,
    ) -> Self {
        let resolver = TargetNameResolver::new(config.naming, config.target_prefix.clone());
        let commands = CommandBuilder::new(config.clone());
        Self {
            config,
            resolver,
            commands,
            executor,
            session,
            locks: TargetLockMap::new(),
        }
    }

    fn location_for(&self, lun: &LunRef) -> ProviderLocation {
        ProviderLocation::new(
            self.config.portal_address.clone(),
            self.config.portal_port,
            lun.lun,
            lun.target.clone(),
        )
    }

    /// Where the volume lives on the appliance. The persisted provider
    /// location wins when present; otherwise the name is derived fresh.
    fn volume_lun(&self, volume: &Volume) -> Result<LunRef> {
        match &volume.provider_location {
            Some(location) => Ok(self.resolver.from_location(location)),
            None => self.resolver.resolve(&volume.name),
        }
    }

    async fn remaining_luns(&self, target: &str) -> Result<usize> {
        let output = self.executor.execute(&self.commands.lun_list(target)).await?;
        Ok(output.lines().filter(|line| !line.trim().is_empty()).count())
    }

    /// Delete a LUN, then its target if that was the last LUN under it.
    ///
    /// Ordering is mandatory: deleting the target first would orphan other
    /// LUNs sharing it or leave dangling sessions. Caller must hold the
    /// target lock.
    async fn delete_lun_then_target(&self, lun: &LunRef) -> Result<()> {
        self.executor.execute(&self.commands.lun_delete(lun)).await?;

        let remaining = self.remaining_luns(&lun.target).await?;
        if remaining == 0 {
            debug!("Target {} is empty, deleting it", lun.target);
            self.executor
                .execute(&self.commands.target_delete(&lun.target))
                .await?;
        } else {
            debug!("Target {} still holds {remaining} LUN(s), keeping it", lun.target);
        }
        Ok(())
    }

    /// Create a volume and export it.
    ///
    /// The target is created first and the LUN inside it; target reuse is
    /// expected under shared-target naming, so an "already exists" answer
    /// to target-create is swallowed. Every other failure surfaces
    /// unchanged, and a target left behind by a failed LUN step is picked
    /// up again on retry through the same conflict handling.
    pub async fn create_volume(&self, volume: &Volume) -> Result<ProviderLocation> {
        info!("Creating volume {} ({} GiB)", volume.name, volume.size_gib);

        let lun = self.resolver.resolve(&volume.name)?;
        // Validate before the first appliance round-trip.
        let lun_create = self.commands.lun_create(&lun, volume.size_gib)?;

        let _guard = self.locks.lock(&lun.target).await;

        match self
            .executor
            .execute(&self.commands.target_create(&lun.target))
            .await
        {
            Ok(_) => {}
            Err(err) if err.is_already_exists() => {
                debug!("Target {} already exists, reusing it", lun.target);
            }
            Err(err) => return Err(err),
        }

        self.executor.execute(&lun_create).await?;
        Ok(self.location_for(&lun))
    }

    /// Create a volume as an independent copy of a snapshot.
    pub async fn create_volume_from_snapshot(
        &self,
        volume: &Volume,
        snapshot: &Snapshot,
    ) -> Result<()> {
        info!(
            "Creating volume {} from snapshot {}",
            volume.name, snapshot.name
        );

        let snapshot_lun = self.resolver.resolve(&snapshot.name)?;
        let volume_lun = self.volume_lun(volume)?;

        let _guard = self.locks.lock(&volume_lun.target).await;
        self.executor
            .execute(
                &self
                    .commands
                    .lun_clone(&snapshot_lun, &volume_lun, CloneType::Normal),
            )
            .await?;
        Ok(())
    }

    /// Delete a volume's LUN, and its target once the target is empty.
    pub async fn delete_volume(&self, volume: &Volume) -> Result<()> {
        info!("Deleting volume {}", volume.name);

        let lun = self.volume_lun(volume)?;
        let _guard = self.locks.lock(&lun.target).await;
        self.delete_lun_then_target(&lun).await
    }

    /// Snapshot a volume as an appliance-tracked, space-efficient clone.
    pub async fn create_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        info!(
            "Creating snapshot {} of volume {}",
            snapshot.name, snapshot.volume_name
        );

        let parent_lun = self.resolver.resolve(&snapshot.volume_name)?;
        let snapshot_lun = self.resolver.resolve(&snapshot.name)?;

        let _guard = self.locks.lock(&snapshot_lun.target).await;
        self.executor
            .execute(
                &self
                    .commands
                    .lun_clone(&parent_lun, &snapshot_lun, CloneType::Snapshot),
            )
            .await?;
        Ok(())
    }

    /// Delete a snapshot's LUN, and its target once the target is empty.
    pub async fn delete_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        info!("Deleting snapshot {}", snapshot.name);

        let lun = self.resolver.resolve(&snapshot.name)?;
        let _guard = self.locks.lock(&lun.target).await;
        self.delete_lun_then_target(&lun).await
    }

    /// Compute the provider location for a volume.
    ///
    /// Target creation already exports the LUN, so no appliance call is
    /// needed here.
    pub async fn create_export(&self, volume: &Volume) -> Result<ProviderLocation> {
        let lun = self.volume_lun(volume)?;
        Ok(self.location_for(&lun))
    }

    /// Exports are implicit in the create path; nothing to re-establish.
    pub async fn ensure_export(&self, _volume: &Volume) -> Result<()> {
        Ok(())
    }

    /// Exports are implicit in the create path; nothing to remove.
    pub async fn remove_export(&self, _volume: &Volume) -> Result<()> {
        Ok(())
    }

    /// Scope the volume's target to the requesting initiator, then hand
    /// off to block-transport session setup.
    ///
    /// The ACL update runs strictly before session setup so the session
    /// never sees a target open to anyone else.
    pub async fn initialize_connection(
        &self,
        volume: &Volume,
        connector: &Connector,
    ) -> Result<ConnectionInfo> {
        info!("Initializing connection to volume {}", volume.name);

        let initiator = connector.initiator.as_deref().ok_or_else(|| {
            ValidationError::MissingInitiator {
                volume: volume.name.clone(),
            }
        })?;

        let lun = self.volume_lun(volume)?;
        let location = match &volume.provider_location {
            Some(location) => location.clone(),
            None => self.location_for(&lun),
        };

        let _guard = self.locks.lock(&lun.target).await;
        self.executor
            .execute(
                &self
                    .commands
                    .target_modify(&lun.target, &TargetAcl::Grant(initiator.to_string())),
            )
            .await?;

        self.session.connect(volume, connector, &location).await
    }

    /// Clear the target's ACL.
    ///
    /// The appliance identifies the target by name, so this succeeds even
    /// when the connector record is stale or empty; a missing initiator
    /// identity is logged as an anomaly rather than blocking the detach,
    /// which would leak appliance resources.
    pub async fn terminate_connection(&self, volume: &Volume, connector: &Connector) -> Result<()> {
        info!("Terminating connection to volume {}", volume.name);

        if connector.initiator.is_none() {
            error!(
                "No initiator recorded for volume {}; clearing the target ACL by name only",
                volume.name
            );
        }

        let lun = self.volume_lun(volume)?;
        let _guard = self.locks.lock(&lun.target).await;
        self.executor
            .execute(&self.commands.target_modify(&lun.target, &TargetAcl::Revoke))
            .await?;
        Ok(())
    }
}
