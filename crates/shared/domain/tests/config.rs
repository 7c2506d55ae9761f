use mstone_domain::ModuleStatus;
use mstone_domain::config::{AppConfig, CoordinatorConfig, LifecycleConfig, ReusePolicy};
use serde_json::json;
use std::time::Duration;

#[test]
fn config_defaults_are_sane() {
    let lifecycle = LifecycleConfig::default();
    assert_eq!(lifecycle.operation_timeout(), Duration::from_millis(500));
    assert_eq!(lifecycle.faults.io, ModuleStatus::Failed);
    assert_eq!(lifecycle.faults.illegal_state, ModuleStatus::Error);
    assert_eq!(lifecycle.faults.panic, ModuleStatus::Crashed);

    let coordinator = CoordinatorConfig::default();
    assert_eq!(coordinator.max_attempts, 3);
    assert_eq!(coordinator.settle_timeout(), Duration::from_secs(2));
    assert_eq!(coordinator.reuse, ReusePolicy::SameFeature);
    assert!(!coordinator.retry_on.contains(&ModuleStatus::Invalid));

    let config = AppConfig::default();
    assert!(config.registry.features.is_empty());
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.console);
}

#[test]
fn app_config_deserializes_partial_documents() {
    let raw = json!({
        "lifecycle": { "operation_timeout_ms": 250, "faults": { "io": "crashed" } },
        "coordinator": { "reuse": "same_module", "retry_on": ["failed"] },
        "registry": { "features": { "SCAN": "Module02" } },
        "logging": { "level": "debug", "json": true }
    });

    let cfg: AppConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.lifecycle.operation_timeout_ms, 250);
    assert_eq!(cfg.lifecycle.faults.io, ModuleStatus::Crashed);
    assert_eq!(cfg.lifecycle.faults.timeout, ModuleStatus::Failed);
    assert_eq!(cfg.coordinator.reuse, ReusePolicy::SameModule);
    assert_eq!(cfg.coordinator.retry_on, vec![ModuleStatus::Failed]);
    assert_eq!(cfg.coordinator.max_attempts, 3);
    assert_eq!(cfg.registry.features.get("SCAN").map(String::as_str), Some("Module02"));
    assert!(cfg.logging.json);
}

#[test]
fn cloned_config_copies_on_write() {
    let original = AppConfig::default();
    let mut tuned = original.clone();
    tuned.coordinator.max_attempts = 5;

    assert_eq!(original.coordinator.max_attempts, 3);
    assert_eq!(tuned.coordinator.max_attempts, 5);
}
