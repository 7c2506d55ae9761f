use crate::module::ModuleStatus;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub lifecycle: LifecycleConfig,
    pub coordinator: CoordinatorConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Lifecycle engine knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Upper bound for one load/unload critical section.
    pub operation_timeout_ms: u64,
    pub faults: FaultPolicyConfig,
}

/// Status assigned to each class of processor fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FaultPolicyConfig {
    pub io: ModuleStatus,
    pub timeout: ModuleStatus,
    pub illegal_state: ModuleStatus,
    pub missing_resource: ModuleStatus,
    pub panic: ModuleStatus,
    pub unknown: ModuleStatus,
}

/// When a request may reuse the module that is already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReusePolicy {
    /// Reuse only when the same feature was served last; switching features reloads.
    #[default]
    SameFeature,
    /// Reuse whenever the feature maps to the loaded module.
    SameModule,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub max_attempts: u32,
    pub settle_timeout_ms: u64,
    pub reuse: ReusePolicy,
    /// Outcomes that trigger another attempt.
    pub retry_on: Vec<ModuleStatus>,
}

/// Extra feature to module mappings on top of the built-in table.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub features: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub console: bool,
    /// Directory for rolling log files; file output is off when unset.
    pub path: Option<PathBuf>,
    pub json: bool,
    pub env_filter: Option<String>,
}

impl LifecycleConfig {
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub const fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

// --- Default ---

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { operation_timeout_ms: 500, faults: FaultPolicyConfig::default() }
    }
}

impl Default for FaultPolicyConfig {
    fn default() -> Self {
        Self {
            io: ModuleStatus::Failed,
            timeout: ModuleStatus::Failed,
            illegal_state: ModuleStatus::Error,
            missing_resource: ModuleStatus::Crashed,
            panic: ModuleStatus::Crashed,
            unknown: ModuleStatus::Crashed,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            settle_timeout_ms: 2_000,
            reuse: ReusePolicy::default(),
            retry_on: vec![ModuleStatus::Failed, ModuleStatus::Error, ModuleStatus::Crashed],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            console: true,
            path: None,
            json: false,
            env_filter: None,
        }
    }
}
