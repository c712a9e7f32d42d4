//! Lifecycle tests against a recording fake executor

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use san_volume_core::{
    ConnectionInfo, Connector, ExecutionError, NamingStrategy, ProviderLocation, Result, Snapshot,
    StorageError, TransportKind, ValidationError, Volume, VolumeDriverConfig,
};

use crate::driver::SanVolumeDriver;
use crate::executor::CommandExecutor;
use crate::session::BlockTransportSession;

/// Records every argv it receives and answers from a per-operation script.
/// Unscripted operations succeed with empty output.
#[derive(Default)]
struct FakeExecutor {
    calls: Mutex<Vec<Vec<String>>>,
    script: Mutex<HashMap<String, VecDeque<std::result::Result<String, String>>>>,
    events: Option<Arc<Mutex<Vec<String>>>>,
}

impl FakeExecutor {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_events(events: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            events: Some(events),
            ..Self::default()
        })
    }

    /// Queue the next response for an operation, keyed as `"<noun> <verb>"`.
    fn stub(&self, operation: &str, response: std::result::Result<&str, &str>) {
        self.script
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(response.map(str::to_string).map_err(str::to_string));
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(&self, args: &[String]) -> Result<String> {
        self.calls.lock().unwrap().push(args.to_vec());
        let operation = format!("{} {}", args[1], args[2]);
        if let Some(events) = &self.events {
            events.lock().unwrap().push(operation.clone());
        }

        let next = self
            .script
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(Ok(output)) => Ok(output),
            Some(Err(diagnostic)) => Err(ExecutionError::CommandFailed {
                command: args.join(" "),
                output: diagnostic,
            }
            .into()),
            None => Ok(String::new()),
        }
    }
}

/// Session delegate that records when it runs.
struct FakeSession {
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BlockTransportSession for FakeSession {
    async fn connect(
        &self,
        _volume: &Volume,
        _connector: &Connector,
        location: &ProviderLocation,
    ) -> Result<ConnectionInfo> {
        self.events.lock().unwrap().push("session connect".to_string());
        Ok(ConnectionInfo {
            transport: TransportKind::Iscsi,
            portal: location.portal(),
            target: location.target.clone(),
            lun: location.lun,
        })
    }
}

fn test_config() -> VolumeDriverConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut config = VolumeDriverConfig::new("1.1.1.1");
    config.target_prefix = "tgt_".to_string();
    config
}

fn driver(executor: Arc<FakeExecutor>) -> SanVolumeDriver {
    SanVolumeDriver::new(test_config(), executor)
}

fn exported_volume(name: &str, target: &str) -> Volume {
    let mut volume = Volume::new(name, 1);
    volume.provider_location =
        Some(format!("1.1.1.1:3260,1 {target}").parse().unwrap());
    volume
}

#[tokio::test]
async fn create_volume_issues_target_then_lun_and_returns_location() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    let location = driver.create_volume(&Volume::new("v1", 1)).await.unwrap();
    assert_eq!(location.to_string(), "1.1.1.1:3260,1 tgt_v1");

    let calls = executor.calls();
    assert_eq!(
        calls[0],
        vec![
            "sancli",
            "target",
            "create",
            "--name=tgt_v1",
            "--require-allow=true"
        ]
    );
    assert_eq!(
        calls[1],
        vec![
            "sancli",
            "lun",
            "create",
            "--name=tgt_v1:1",
            "--size=1G",
            "--access-pattern=random"
        ]
    );
    assert_eq!(calls.len(), 2);
}

#[tokio::test]
async fn create_volume_swallows_existing_target() {
    let executor = FakeExecutor::new();
    executor.stub("target create", Err("target tgt_v1 already exists"));
    let driver = driver(executor.clone());

    let location = driver.create_volume(&Volume::new("v1", 1)).await.unwrap();
    assert_eq!(location.target_name(), "tgt_v1");
    // Both steps still ran.
    assert_eq!(executor.calls().len(), 2);
}

#[tokio::test]
async fn create_volume_surfaces_existing_lun() {
    let executor = FakeExecutor::new();
    executor.stub("target create", Err("target tgt_v1 already exists"));
    executor.stub("lun create", Err("lun tgt_v1:1 already exists"));
    let driver = driver(executor.clone());

    let err = driver.create_volume(&Volume::new("v1", 1)).await.unwrap_err();
    assert!(matches!(err, StorageError::Execution(_)));
}

#[tokio::test]
async fn create_volume_surfaces_other_target_failures() {
    let executor = FakeExecutor::new();
    executor.stub("target create", Err("connection to appliance lost"));
    let driver = driver(executor.clone());

    let err = driver.create_volume(&Volume::new("v1", 1)).await.unwrap_err();
    assert!(matches!(err, StorageError::Execution(_)));
    // The LUN step never ran.
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn create_volume_rejects_zero_size_before_any_command() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    let err = driver.create_volume(&Volume::new("v1", 0)).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Validation(ValidationError::InvalidSize { .. })
    ));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn delete_volume_removes_the_emptied_target() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    driver
        .delete_volume(&exported_volume("v1", "tgt_v1"))
        .await
        .unwrap();

    let calls = executor.calls();
    assert_eq!(
        calls[0],
        vec!["sancli", "lun", "delete", "--name=tgt_v1:1"]
    );
    assert_eq!(calls[1], vec!["sancli", "lun", "list", "--target=tgt_v1"]);
    assert_eq!(
        calls[2],
        vec!["sancli", "target", "delete", "--name=tgt_v1", "--force"]
    );
}

#[tokio::test]
async fn delete_volume_keeps_an_occupied_target() {
    let executor = FakeExecutor::new();
    executor.stub("lun list", Ok("tgt_shared:2\n"));
    let driver = driver(executor.clone());

    driver
        .delete_volume(&exported_volume("v1", "tgt_shared"))
        .await
        .unwrap();

    let calls = executor.calls();
    assert_eq!(calls.len(), 2, "no target delete for an occupied target");
    assert_eq!(calls[1][1], "lun");
    assert_eq!(calls[1][2], "list");
}

#[tokio::test]
async fn delete_volume_is_not_idempotent() {
    let executor = FakeExecutor::new();
    executor.stub("lun delete", Ok(""));
    executor.stub("lun delete", Err("lun tgt_v1:1 does not exist"));
    let driver = driver(executor.clone());
    let volume = exported_volume("v1", "tgt_v1");

    driver.delete_volume(&volume).await.unwrap();
    let err = driver.delete_volume(&volume).await.unwrap_err();
    assert!(matches!(err, StorageError::Execution(_)));
}

#[tokio::test]
async fn create_snapshot_clones_with_snapshot_semantics() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    driver
        .create_snapshot(&Snapshot::new("s1", "v1"))
        .await
        .unwrap();

    let calls = executor.calls();
    assert_eq!(
        calls[0],
        vec![
            "sancli",
            "lun",
            "clone",
            "--name=tgt_v1:1",
            "--clone=tgt_s1:1",
            "--type=snapshot"
        ]
    );
}

#[tokio::test]
async fn create_volume_from_snapshot_clones_independently() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    driver
        .create_volume_from_snapshot(
            &exported_volume("v2", "tgt_v2"),
            &Snapshot::new("s1", "v1"),
        )
        .await
        .unwrap();

    let calls = executor.calls();
    assert_eq!(
        calls[0],
        vec![
            "sancli",
            "lun",
            "clone",
            "--name=tgt_s1:1",
            "--clone=tgt_v2:1",
            "--type=normal"
        ]
    );
}

#[tokio::test]
async fn composite_naming_rejects_undelimited_snapshot_identifiers() {
    let executor = FakeExecutor::new();
    let mut config = test_config();
    config.naming = NamingStrategy::Composite;
    config.target_prefix = String::new();
    let driver = SanVolumeDriver::new(config, executor.clone());

    let err = driver
        .create_snapshot(&Snapshot::new("no-delimiter", "also-bad"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Validation(ValidationError::MissingDelimiter { .. })
    ));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn delete_snapshot_follows_the_empty_target_rule() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    driver
        .delete_snapshot(&Snapshot::new("s1", "v1"))
        .await
        .unwrap();

    let calls = executor.calls();
    assert_eq!(
        calls[0],
        vec!["sancli", "lun", "delete", "--name=tgt_s1:1"]
    );
    assert_eq!(
        calls[2],
        vec!["sancli", "target", "delete", "--name=tgt_s1", "--force"]
    );
}

#[tokio::test]
async fn create_export_only_computes_the_location() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    let location = driver
        .create_export(&Volume::new("v1", 1))
        .await
        .unwrap();
    assert_eq!(location.to_string(), "1.1.1.1:3260,1 tgt_v1");
    assert!(executor.calls().is_empty());

    driver.ensure_export(&Volume::new("v1", 1)).await.unwrap();
    driver.remove_export(&Volume::new("v1", 1)).await.unwrap();
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn initialize_connection_sets_acl_before_session_setup() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::with_events(events.clone());
    let session = Arc::new(FakeSession {
        events: events.clone(),
    });
    let driver = SanVolumeDriver::with_session(test_config(), executor.clone(), session);

    let info = driver
        .initialize_connection(
            &exported_volume("v1", "tgt_v1"),
            &Connector::with_initiator("iqn.x"),
        )
        .await
        .unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["target modify", "session connect"]
    );
    assert_eq!(info.portal, "1.1.1.1:3260");
    assert_eq!(info.target, "tgt_v1");

    let calls = executor.calls();
    assert_eq!(
        calls[0],
        vec![
            "sancli",
            "target",
            "modify",
            "--name=tgt_v1",
            "--initiator=iqn.x",
            "--require-allow=true"
        ]
    );
}

#[tokio::test]
async fn initialize_connection_requires_an_initiator() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    let err = driver
        .initialize_connection(&exported_volume("v1", "tgt_v1"), &Connector::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Validation(ValidationError::MissingInitiator { .. })
    ));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn terminate_connection_clears_the_acl() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    driver
        .terminate_connection(
            &exported_volume("v1", "tgt_v1"),
            &Connector::with_initiator("iqn.x"),
        )
        .await
        .unwrap();

    assert_eq!(
        executor.calls()[0],
        vec![
            "sancli",
            "target",
            "modify",
            "--name=tgt_v1",
            "--initiator=no",
            "--require-allow=false"
        ]
    );
}

#[tokio::test]
async fn terminate_connection_tolerates_an_empty_connector() {
    let executor = FakeExecutor::new();
    let driver = driver(executor.clone());

    driver
        .terminate_connection(&exported_volume("v1", "tgt_v1"), &Connector::default())
        .await
        .unwrap();
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn terminate_connection_surfaces_acl_failures() {
    let executor = FakeExecutor::new();
    executor.stub("target modify", Err("appliance unreachable"));
    let driver = driver(executor.clone());

    let err = driver
        .terminate_connection(
            &exported_volume("v1", "tgt_v1"),
            &Connector::with_initiator("iqn.x"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Execution(_)));
}
