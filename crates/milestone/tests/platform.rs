use mstone::domain::config::AppConfig;
use mstone::domain::{FeatureId, ModuleId, ModuleStatus, Route};
use mstone::kernel::lifecycle::Operation;
use mstone::kernel::processor::{ModuleProcessor, ProcessorFault};
use mstone::{Platform, PlatformError};
use mstone_event_bus::EventReceiverExt;
use std::fs;
use std::sync::Arc;

#[derive(Debug)]
struct Refusing;

impl ModuleProcessor for Refusing {
    fn name(&self) -> &str {
        "refusing"
    }

    fn initialize(&self) -> Result<bool, ProcessorFault> {
        Ok(false)
    }

    fn cleanup(&self) -> Result<bool, ProcessorFault> {
        Ok(true)
    }
}

#[tokio::test]
async fn request_reaches_the_ui_queue() {
    let platform = Platform::builder().build().unwrap();
    let mut ui = platform.take_navigation().expect("queue is handed out once");
    assert!(platform.take_navigation().is_none());

    let outcome = platform.coordinator().request_feature(&FeatureId::pdf()).await;

    assert!(outcome.is_shown());
    assert_eq!(platform.engine().active_module().map(|a| a.module), Some(ModuleId::tools()));
    let command = ui.recv().await.unwrap();
    assert_eq!(command.route, Route::Feature(FeatureId::pdf()));
    assert!(!command.clear_history);
}

#[tokio::test]
async fn transitions_are_published_on_the_bus() {
    let platform = Platform::builder().build().unwrap();
    let mut events = platform.lifecycle_events().unwrap();

    platform.engine().load(&ModuleId::tools()).await;

    let first = EventReceiverExt::recv(&mut events).await.unwrap();
    assert_eq!((first.operation, first.status), (Operation::Load, ModuleStatus::Loading));
    let second = EventReceiverExt::recv(&mut events).await.unwrap();
    assert_eq!(second.status, ModuleStatus::Success);
}

#[tokio::test]
async fn failing_tools_send_the_user_home() {
    let platform = Platform::builder().tools(Arc::new(Refusing)).build().unwrap();
    let mut ui = platform.take_navigation().unwrap();

    let outcome = platform.coordinator().request_feature(&FeatureId::word()).await;

    assert_eq!((outcome.attempts, outcome.status), (3, ModuleStatus::Failed));
    assert_eq!(*ui.recv().await.unwrap(), mstone::prelude::NavigationCommand::home());
}

#[tokio::test]
async fn config_file_extends_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("milestone.toml");
    fs::write(
        &path,
        "[coordinator]\nmax_attempts = 1\n\n[registry.features]\nscan = \"Module02\"\n",
    )
    .unwrap();

    let platform = Platform::from_config_file(Some(&path)).unwrap();

    assert_eq!(platform.coordinator().policy().max_attempts, 1);
    assert_eq!(platform.registry().resolve(&FeatureId::from("scan")), Some(&ModuleId::numbered(2)));
    assert_eq!(platform.registry().resolve(&FeatureId::ocr()), Some(&ModuleId::tools()));

    let outcome = platform.coordinator().request_feature(&FeatureId::from("scan")).await;
    assert!(outcome.is_shown(), "placeholder modules load successfully");
}

#[test]
fn blank_registry_entries_are_rejected() {
    let mut config = AppConfig::default();
    config.registry.features.insert("scan".into(), " ".into());

    let err = Platform::builder().config(config).build().unwrap_err();
    assert!(matches!(err, PlatformError::Registry { .. }), "{err}");
}

#[test]
fn zero_timeout_is_rejected() {
    let mut config = AppConfig::default();
    config.lifecycle.operation_timeout_ms = 0;

    let err = Platform::builder().config(config).build().unwrap_err();
    assert!(matches!(err, PlatformError::Lifecycle { .. }), "{err}");
}

#[tokio::test]
async fn shutdown_closes_the_queue() {
    let platform = Platform::builder().build().unwrap();
    let mut ui = platform.take_navigation().unwrap();

    platform.shutdown().await;

    assert!(ui.recv().await.is_none());
}
