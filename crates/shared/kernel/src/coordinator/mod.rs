//! # Request coordinator
//!
//! Turns "show me feature X" into lifecycle calls and a navigation decision.
//!
//! 1. Unmapped features go straight home; the engine is never called.
//! 2. A feature whose module is already loaded is shown without reloading
//!    (see [`ReusePolicy`]).
//! 3. Otherwise the module is loaded with a bounded number of attempts. Success shows the
//!    feature; running out of attempts goes home.
//!
//! Waiting is notification based: the coordinator awaits the engine's `watch` channels,
//! each wait capped by the settle timeout.

mod navigator;

pub use navigator::{ChannelNavigator, NavigationCommand, Navigator};

use crate::lifecycle::LifecycleEngine;
use crate::registry::FeatureRegistry;
use mstone_domain::config::{CoordinatorConfig, ReusePolicy};
use mstone_domain::{FeatureId, ModuleId, ModuleStatus, Route};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

/// Retry and reuse rules of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total load attempts per request, at least one.
    pub max_attempts: u32,
    /// Cap on every wait for the engine to settle or go idle.
    pub settle_timeout: Duration,
    pub reuse: ReusePolicy,
    pub retry_on: Vec<ModuleStatus>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&CoordinatorConfig::default())
    }
}

impl From<&CoordinatorConfig> for RetryPolicy {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            settle_timeout: config.settle_timeout(),
            reuse: config.reuse,
            retry_on: config.retry_on.clone(),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn should_retry(&self, status: ModuleStatus) -> bool {
        self.retry_on.contains(&status)
    }
}

/// Where a request ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub route: Route,
    /// Load attempts made; zero when the engine was not needed.
    pub attempts: u32,
    /// Final status; `Success` on reuse, `Failed` for unmapped features.
    pub status: ModuleStatus,
}

impl RequestOutcome {
    #[must_use]
    pub const fn is_shown(&self) -> bool {
        matches!(self.route, Route::Feature(_))
    }
}

/// Result of a task started with [`RequestCoordinator::spawn_request`] or
/// [`RequestCoordinator::spawn_release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Request { feature: FeatureId, outcome: RequestOutcome },
    Release { feature: FeatureId, status: ModuleStatus },
}

/// Drives the lifecycle engine on behalf of navigation requests.
#[derive(Debug)]
pub struct RequestCoordinator {
    engine: LifecycleEngine,
    registry: FeatureRegistry,
    navigator: Arc<dyn Navigator>,
    policy: RetryPolicy,
    /// Feature shown by the last successful request.
    served: Mutex<Option<FeatureId>>,
    tasks: Mutex<JoinSet<TaskOutcome>>,
}

impl RequestCoordinator {
    #[must_use]
    pub fn new(
        engine: LifecycleEngine,
        registry: FeatureRegistry,
        navigator: Arc<dyn Navigator>,
        policy: RetryPolicy,
    ) -> Self {
        let policy = RetryPolicy { max_attempts: policy.max_attempts.max(1), ..policy };
        Self {
            engine,
            registry,
            navigator,
            policy,
            served: Mutex::new(None),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    #[must_use]
    pub const fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    #[must_use]
    pub const fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The feature shown by the last successful request, if its module is still loaded.
    #[must_use]
    pub fn served_feature(&self) -> Option<FeatureId> {
        self.served.lock().clone()
    }

    /// Loads the module behind `feature` and navigates to it, or home on failure.
    #[instrument(name = "request_feature", skip_all, fields(feature = %feature))]
    pub async fn request_feature(&self, feature: &FeatureId) -> RequestOutcome {
        let Some(module) = self.registry.resolve(feature).cloned() else {
            warn!("Feature is not mapped to any module, navigating home");
            self.navigator.navigate_home();
            return RequestOutcome { route: Route::Home, attempts: 0, status: ModuleStatus::Failed };
        };

        if self.can_reuse(feature, &module) {
            debug!(%module, "Module already loaded, navigating to feature");
            return self.show(feature, 0);
        }

        let mut last = ModuleStatus::Failed;
        let mut attempts = 0;
        while attempts < self.policy.max_attempts {
            attempts += 1;
            debug!(attempt = attempts, %module, "Loading module for feature");

            let status = self.settle(self.engine.load(&module).await).await;
            if status == ModuleStatus::Success {
                info!(attempt = attempts, %module, "Module loaded, navigating to feature");
                return self.show(feature, attempts);
            }

            // Whatever was served before is gone or was never touched; either way reload next time.
            self.served.lock().take();
            last = status;

            if !self.policy.should_retry(status) {
                warn!(attempt = attempts, %status, "Load outcome is not retryable");
                break;
            }
            if attempts < self.policy.max_attempts {
                warn!(attempt = attempts, max = self.policy.max_attempts, %status, "Module load failed, retrying");
                if !self.engine.wait_idle(self.policy.settle_timeout).await {
                    warn!("Lifecycle engine still busy after settle timeout");
                }
            }
        }

        error!(attempts, status = %last, "Module load failed, navigating home");
        self.navigator.navigate_home();
        RequestOutcome { route: Route::Home, attempts, status: last }
    }

    /// Unloads the module behind `feature` and logs the outcome.
    ///
    /// Unmapped features are `Failed`. Navigation is left to the caller.
    #[instrument(name = "release_feature", skip_all, fields(feature = %feature))]
    pub async fn release_feature(&self, feature: &FeatureId) -> ModuleStatus {
        let Some(module) = self.registry.resolve(feature).cloned() else {
            error!("Feature is not mapped to any module");
            return ModuleStatus::Failed;
        };

        let status = self.settle(self.engine.unload(&module).await).await;
        if status == ModuleStatus::Unloaded {
            info!(%module, "Module unloaded");
            self.served.lock().take();
        } else {
            error!(%module, %status, "Failed to unload module");
        }
        status
    }

    /// Runs [`Self::request_feature`] as a task owned by the coordinator.
    ///
    /// Must be called within a Tokio runtime.
    pub fn spawn_request(self: &Arc<Self>, feature: FeatureId) -> AbortHandle {
        let this = Arc::clone(self);
        self.tasks.lock().spawn(async move {
            let outcome = this.request_feature(&feature).await;
            TaskOutcome::Request { feature, outcome }
        })
    }

    /// Runs [`Self::release_feature`] as a task owned by the coordinator.
    ///
    /// Must be called within a Tokio runtime.
    pub fn spawn_release(self: &Arc<Self>, feature: FeatureId) -> AbortHandle {
        let this = Arc::clone(self);
        self.tasks.lock().spawn(async move {
            let status = this.release_feature(&feature).await;
            TaskOutcome::Release { feature, status }
        })
    }

    /// Number of spawned tasks not yet collected.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Waits for every spawned task and returns their outcomes in completion order.
    pub async fn drain(&self) -> Vec<TaskOutcome> {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) if err.is_cancelled() => debug!("Coordinator task cancelled"),
                Err(err) => error!(error = %err, "Coordinator task failed"),
            }
        }
        outcomes
    }

    /// Cancels every spawned task and waits for them to wind down.
    ///
    /// Cancelled lifecycle operations release their claim as they unwind.
    pub async fn shutdown(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        if !tasks.is_empty() {
            info!(tasks = tasks.len(), "Cancelling coordinator tasks");
        }
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }

    fn can_reuse(&self, feature: &FeatureId, module: &ModuleId) -> bool {
        let loaded = self.engine.active_module().is_some_and(|info| info.is_loaded(module))
            && self.engine.current_status() == ModuleStatus::Success;
        if !loaded {
            return false;
        }

        match self.policy.reuse {
            ReusePolicy::SameModule => true,
            ReusePolicy::SameFeature => self.served.lock().as_ref() == Some(feature),
        }
    }

    /// Replaces a transient status with the settled one; a settle timeout counts as `Error`.
    async fn settle(&self, status: ModuleStatus) -> ModuleStatus {
        if status.is_settled() {
            return status;
        }
        self.engine.settled_status(self.policy.settle_timeout).await.unwrap_or_else(|| {
            error!(timeout = ?self.policy.settle_timeout, "Module status did not settle");
            ModuleStatus::Error
        })
    }

    fn show(&self, feature: &FeatureId, attempts: u32) -> RequestOutcome {
        *self.served.lock() = Some(feature.clone());
        let route = Route::Feature(feature.clone());
        self.navigator.navigate_to(route.clone());
        RequestOutcome { route, attempts, status: ModuleStatus::Success }
    }
}
