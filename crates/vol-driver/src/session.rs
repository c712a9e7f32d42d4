//! Block-transport session boundary
//!
//! Session setup is an external collaborator: it is handed a volume whose
//! target is already scoped to the connecting initiator and returns the
//! connection tuple the compute host dials. The driver treats it as an
//! opaque delegate.

use async_trait::async_trait;

use san_volume_core::{
    ConnectionInfo, Connector, ProviderLocation, Result, TransportKind, Volume,
};

/// Produces connection details for an exported, access-scoped volume
#[async_trait]
pub trait BlockTransportSession: Send + Sync {
    async fn connect(
        &self,
        volume: &Volume,
        connector: &Connector,
        location: &ProviderLocation,
    ) -> Result<ConnectionInfo>;
}

/// Default iSCSI session builder
///
/// The connection tuple is fully determined by the provider location; no
/// appliance round-trip is needed.
#[derive(Debug, Default)]
pub struct IscsiSessionBuilder;

#[async_trait]
impl BlockTransportSession for IscsiSessionBuilder {
    async fn connect(
        &self,
        _volume: &Volume,
        _connector: &Connector,
        location: &ProviderLocation,
    ) -> Result<ConnectionInfo> {
        Ok(ConnectionInfo {
            transport: TransportKind::Iscsi,
            portal: location.portal(),
            target: location.target.clone(),
            lun: location.lun,
        })
    }
}
