//! Facade crate for Milestone.
//! Re-exports the domain, kernel and tool crates and composes them into a [`Platform`].
//! Keep this crate thin: it should wire other crates together, not implement lifecycle logic.
//!
//! ## Usage
//! ```no_run
//! # async fn run() -> Result<(), mstone::PlatformError> {
//! use mstone::domain::FeatureId;
//!
//! let platform = mstone::Platform::builder().build()?;
//! let mut ui = platform.take_navigation().expect("first take");
//! platform.coordinator().request_feature(&FeatureId::ocr()).await;
//! let command = ui.recv().await;
//! # Ok(()) }
//! ```

mod error;

pub use crate::error::{PlatformError, PlatformErrorExt};
pub use mstone_domain as domain;
pub use mstone_event_bus as events;
pub use mstone_kernel as kernel;
pub use mstone_kernel::prelude;
pub use mstone_tools as tools;

use mstone_domain::config::AppConfig;
use mstone_event_bus::EventBus;
use mstone_kernel::catalog::ModuleCatalog;
use mstone_kernel::config::load_config_or_default;
use mstone_kernel::coordinator::{ChannelNavigator, NavigationCommand, RequestCoordinator, RetryPolicy};
use mstone_kernel::lifecycle::{LifecycleEngine, LifecycleEvent};
use mstone_kernel::processor::ModuleProcessor;
use mstone_kernel::registry::FeatureRegistry;
use mstone_tools::ProductTools;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

/// Buffer of the UI navigation queue.
pub const NAVIGATION_CAPACITY: usize = 64;

/// The composed lifecycle stack: registry, engine and coordinator sharing one event bus.
#[derive(Debug)]
pub struct Platform {
    config: AppConfig,
    bus: EventBus,
    engine: LifecycleEngine,
    coordinator: Arc<RequestCoordinator>,
    navigation: Mutex<Option<mpsc::Receiver<Arc<NavigationCommand>>>>,
}

impl Platform {
    pub fn builder() -> PlatformBuilder {
        PlatformBuilder::default()
    }

    /// Builds a platform from the config file at `path`, or from defaults when it is absent.
    ///
    /// # Errors
    /// Returns [`PlatformError`] if the file is malformed or the wiring is rejected.
    pub fn from_config_file(path: Option<impl AsRef<Path>>) -> Result<Self, PlatformError> {
        let config: AppConfig = load_config_or_default(path)?;
        Self::builder().config(config).build()
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub const fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    #[must_use]
    pub const fn coordinator(&self) -> &Arc<RequestCoordinator> {
        &self.coordinator
    }

    #[must_use]
    pub fn registry(&self) -> &FeatureRegistry {
        self.coordinator.registry()
    }

    /// Hands out the navigation queue for the UI-affine consumer. Only the first call
    /// gets it.
    pub fn take_navigation(&self) -> Option<mpsc::Receiver<Arc<NavigationCommand>>> {
        self.navigation.lock().take()
    }

    /// Subscribes to the engine's transition log.
    ///
    /// # Errors
    /// Returns [`PlatformError::Events`] if the bus has a conflicting channel.
    pub fn lifecycle_events(&self) -> Result<broadcast::Receiver<Arc<LifecycleEvent>>, PlatformError> {
        Ok(self.bus.subscribe::<LifecycleEvent>()?)
    }

    /// Cancels outstanding coordinator work and closes the bus.
    pub async fn shutdown(&self) {
        self.coordinator.shutdown().await;
        let closed = self.bus.shutdown();
        info!(channels = closed, "Platform shut down");
    }
}

/// Builder for [`Platform`].
#[derive(Debug, Default)]
#[must_use = "The builder does nothing until `build` is called."]
pub struct PlatformBuilder {
    config: Option<AppConfig>,
    bus: Option<EventBus>,
    tools: Option<Arc<dyn ModuleProcessor>>,
}

impl PlatformBuilder {
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Shares an existing bus instead of creating one.
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Replaces [`ProductTools`] as the `Module01` processor.
    pub fn tools(mut self, tools: Arc<dyn ModuleProcessor>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// # Errors
    /// Returns [`PlatformError`] when a configured registry entry, the lifecycle
    /// settings, or the navigation queue is rejected.
    pub fn build(self) -> Result<Platform, PlatformError> {
        let config = self.config.unwrap_or_default();
        let bus = self.bus.unwrap_or_default();
        let tools = self.tools.unwrap_or_else(|| Arc::new(ProductTools::new()));

        let registry = FeatureRegistry::from_config(&config.registry)?;
        let engine = LifecycleEngine::builder()
            .catalog(ModuleCatalog::standard(tools))
            .config(&config.lifecycle)
            .event_bus(bus.clone())
            .build()?;

        let navigation = bus
            .subscribe_mpsc::<NavigationCommand>(NAVIGATION_CAPACITY)
            .context("navigation queue")?;
        let coordinator = Arc::new(RequestCoordinator::new(
            engine.clone(),
            registry,
            Arc::new(ChannelNavigator::new(bus.clone())),
            RetryPolicy::from(&config.coordinator),
        ));

        info!(
            features = coordinator.registry().len(),
            modules = engine.catalog().len(),
            timeout = ?engine.operation_timeout(),
            "Platform assembled"
        );

        Ok(Platform { config, bus, engine, coordinator, navigation: Mutex::new(Some(navigation)) })
    }
}
