use super::guard::Claim;
use super::{FaultPolicy, LifecycleError, LifecycleEvent, LifecycleStats, Operation};
use crate::catalog::{CatalogEntry, ModuleCatalog};
use crate::processor::{ModuleProcessor, ProcessorFault};
use crate::registry::FeatureRegistry;
use mstone_domain::config::{FaultPolicyConfig, LifecycleConfig};
use mstone_domain::{ActiveModuleInfo, FeatureId, LifecycleFlags, ModuleId, ModuleStatus};
use mstone_event_bus::EventBus;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Serializes module loads and unloads and publishes their outcome.
///
/// Cheap to clone; clones drive the same engine. Build it once at the composition root
/// and hand clones to whoever needs them.
#[derive(Debug, Clone)]
pub struct LifecycleEngine {
    shared: Arc<Shared>,
}

#[derive(Debug)]
pub(super) struct Shared {
    catalog: ModuleCatalog,
    policy: FaultPolicy,
    operation_timeout: Duration,
    bus: Option<EventBus>,
    gate: Mutex<()>,
    pub(super) flags: watch::Sender<LifecycleFlags>,
    status: watch::Sender<ModuleStatus>,
    active: watch::Sender<Option<ActiveModuleInfo>>,
    counters: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    loads: AtomicU64,
    unloads: AtomicU64,
    swaps: AtomicU64,
    rejected: AtomicU64,
}

/// What happens to the active-module slot when a status is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SlotUpdate {
    /// The slot becomes `(module, status)`.
    Mirror,
    /// The slot becomes empty.
    Clear,
}

impl LifecycleEngine {
    #[must_use]
    pub fn builder() -> LifecycleEngineBuilder {
        LifecycleEngineBuilder::default()
    }

    /// Loads `module`, unloading whatever module is active first.
    ///
    /// Returns `Failed` without waiting if another operation is in progress.
    #[instrument(name = "load", skip_all, fields(module = %module))]
    pub async fn load(&self, module: &ModuleId) -> ModuleStatus {
        self.run(Operation::Load, module).await
    }

    /// Unloads `module`. A successful unload empties the active-module slot.
    ///
    /// Returns `Failed` without waiting if another operation is in progress.
    #[instrument(name = "unload", skip_all, fields(module = %module))]
    pub async fn unload(&self, module: &ModuleId) -> ModuleStatus {
        self.run(Operation::Unload, module).await
    }

    /// Resolves `feature` and loads its module; unmapped features are `Failed`.
    pub async fn load_feature(&self, registry: &FeatureRegistry, feature: &FeatureId) -> ModuleStatus {
        match registry.resolve(feature) {
            Some(module) => {
                info!(%feature, %module, "Loading module for feature");
                self.load(module).await
            },
            None => {
                error!(%feature, "Feature is not mapped to any module");
                ModuleStatus::Failed
            },
        }
    }

    /// Resolves `feature` and unloads its module; unmapped features are `Failed`.
    pub async fn unload_feature(
        &self,
        registry: &FeatureRegistry,
        feature: &FeatureId,
    ) -> ModuleStatus {
        match registry.resolve(feature) {
            Some(module) => {
                info!(%feature, %module, "Unloading module for feature");
                self.unload(module).await
            },
            None => {
                error!(%feature, "Feature is not mapped to any module");
                ModuleStatus::Failed
            },
        }
    }

    #[must_use]
    pub fn current_status(&self) -> ModuleStatus {
        *self.shared.status.borrow()
    }

    /// Status stream; the current value is available immediately.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<ModuleStatus> {
        self.shared.status.subscribe()
    }

    #[must_use]
    pub fn active_module(&self) -> Option<ActiveModuleInfo> {
        self.shared.active.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_active(&self) -> watch::Receiver<Option<ActiveModuleInfo>> {
        self.shared.active.subscribe()
    }

    #[must_use]
    pub fn flags(&self) -> LifecycleFlags {
        *self.shared.flags.borrow()
    }

    #[must_use]
    pub fn subscribe_flags(&self) -> watch::Receiver<LifecycleFlags> {
        self.shared.flags.subscribe()
    }

    /// Waits until the status is no longer transient.
    ///
    /// Returns `None` if that does not happen within `deadline`.
    pub async fn settled_status(&self, deadline: Duration) -> Option<ModuleStatus> {
        let mut rx = self.shared.status.subscribe();
        match timeout(deadline, rx.wait_for(|status| status.is_settled())).await {
            Ok(Ok(status)) => Some(*status),
            Ok(Err(_)) | Err(_) => None,
        }
    }

    /// Waits until no operation holds the claim. Returns `false` on deadline expiry.
    pub async fn wait_idle(&self, deadline: Duration) -> bool {
        let mut rx = self.shared.flags.subscribe();
        matches!(timeout(deadline, rx.wait_for(|flags| flags.is_idle())).await, Ok(Ok(_)))
    }

    #[must_use]
    pub fn stats(&self) -> LifecycleStats {
        let counters = &self.shared.counters;
        LifecycleStats {
            loads: counters.loads.load(Ordering::Relaxed),
            unloads: counters.unloads.load(Ordering::Relaxed),
            swaps: counters.swaps.load(Ordering::Relaxed),
            rejected: counters.rejected.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.shared.catalog
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        self.shared.operation_timeout
    }

    async fn run(&self, operation: Operation, module: &ModuleId) -> ModuleStatus {
        let shared = &*self.shared;

        let Some(claim) = Claim::acquire(shared, operation, module) else {
            shared.counters.rejected.fetch_add(1, Ordering::Relaxed);
            let flags = *shared.flags.borrow();
            warn!(?flags, %operation, "Lifecycle operation already in progress, rejecting");
            return ModuleStatus::Failed;
        };

        let counter = match operation {
            Operation::Load => &shared.counters.loads,
            Operation::Unload => &shared.counters.unloads,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let status = shared.critical_section(operation, module).await;
        claim.settle();
        status
    }
}

impl Shared {
    async fn critical_section(&self, operation: Operation, module: &ModuleId) -> ModuleStatus {
        let Ok(_gate) = timeout(self.operation_timeout, self.gate.lock()).await else {
            return self.expire(operation, module);
        };

        // Unknown ids settle as `Invalid` without touching the active module.
        if operation == Operation::Load && self.catalog.contains(module) {
            let previous = self.active.borrow().as_ref().map(|info| info.module.clone());
            if let Some(previous) = previous {
                self.swap_out(&previous).await;
            }
        }

        match timeout(self.operation_timeout, self.transition(operation, module)).await {
            Ok(status) => status,
            Err(_) => self.expire(operation, module),
        }
    }

    /// Unloads the active module on behalf of a load that already holds the claim and gate.
    async fn swap_out(&self, previous: &ModuleId) {
        if !self.catalog.contains(previous) {
            debug!(%previous, "Clearing slot of unknown module");
            self.active.send_replace(None);
            return;
        }

        self.counters.swaps.fetch_add(1, Ordering::Relaxed);
        info!(%previous, "Unloading active module before load");

        let status = match timeout(self.operation_timeout, self.transition(Operation::Unload, previous))
            .await
        {
            Ok(status) => status,
            Err(_) => self.expire(Operation::Unload, previous),
        };

        if status != ModuleStatus::Unloaded {
            warn!(%previous, %status, "Active module did not unload cleanly, continuing with load");
        }
        self.active.send_replace(None);
    }

    async fn transition(&self, operation: Operation, module: &ModuleId) -> ModuleStatus {
        let Some(entry) = self.catalog.lookup(module).cloned() else {
            error!(%module, %operation, "Invalid module name");
            self.publish(module, operation, ModuleStatus::Invalid, SlotUpdate::Mirror);
            return ModuleStatus::Invalid;
        };

        self.publish(module, operation, operation.transient_status(), SlotUpdate::Mirror);

        let outcome = match entry {
            CatalogEntry::Placeholder => {
                debug!(%module, %operation, "Placeholder module");
                Ok(true)
            },
            CatalogEntry::Processor(processor) => invoke(processor, operation).await,
        };

        let status = match outcome {
            Ok(true) => operation.terminal_status(),
            Ok(false) => {
                error!(%module, %operation, "Module processor reported failure");
                ModuleStatus::Failed
            },
            Err(fault) => {
                let kind = fault.kind();
                let status = self.policy.classify(kind);
                error!(%module, %operation, %kind, %status, error = %fault, "Module processor faulted");
                status
            },
        };

        let slot = if status == ModuleStatus::Unloaded { SlotUpdate::Clear } else { SlotUpdate::Mirror };
        self.publish(module, operation, status, slot);

        if status.is_success() {
            info!(%module, %operation, %status, "Lifecycle operation completed");
        }
        status
    }

    fn expire(&self, operation: Operation, module: &ModuleId) -> ModuleStatus {
        error!(
            %module,
            %operation,
            timeout = ?self.operation_timeout,
            "Lifecycle operation timed out"
        );
        self.publish(module, operation, ModuleStatus::Error, SlotUpdate::Mirror);
        ModuleStatus::Error
    }

    /// Publishes in a fixed order: slot, then status, then the bus event.
    pub(super) fn publish(
        &self,
        module: &ModuleId,
        operation: Operation,
        status: ModuleStatus,
        slot: SlotUpdate,
    ) {
        let info = match slot {
            SlotUpdate::Mirror => Some(ActiveModuleInfo::new(module.clone(), status)),
            SlotUpdate::Clear => None,
        };
        self.active.send_replace(info);
        self.status.send_replace(status);

        if let Some(bus) = &self.bus {
            let event = LifecycleEvent { module: module.clone(), operation, status };
            if let Err(err) = bus.publish(event) {
                warn!(error = %err, "Failed to publish lifecycle event");
            }
        }
    }
}

/// Runs a processor hook on the blocking pool, turning panics into faults.
async fn invoke(
    processor: Arc<dyn ModuleProcessor>,
    operation: Operation,
) -> Result<bool, ProcessorFault> {
    let name = processor.name().to_owned();
    let hook = task::spawn_blocking(move || match operation {
        Operation::Load => processor.initialize(),
        Operation::Unload => processor.cleanup(),
    });

    match hook.await {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(ProcessorFault::Panicked {
            message: panic_message(err.into_panic()).into(),
            context: Some(name.into()),
        }),
        Err(err) => {
            Err(ProcessorFault::Internal { message: err.to_string().into(), context: Some(name.into()) })
        },
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

/// Builder for [`LifecycleEngine`].
#[derive(Debug)]
#[must_use = "The builder does nothing until `build` is called."]
pub struct LifecycleEngineBuilder {
    catalog: ModuleCatalog,
    policy: FaultPolicy,
    faults: Option<FaultPolicyConfig>,
    operation_timeout: Duration,
    bus: Option<EventBus>,
}

impl Default for LifecycleEngineBuilder {
    fn default() -> Self {
        Self {
            catalog: ModuleCatalog::default(),
            policy: FaultPolicy::default(),
            faults: None,
            operation_timeout: LifecycleConfig::default().operation_timeout(),
            bus: None,
        }
    }
}

impl LifecycleEngineBuilder {
    pub fn catalog(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub const fn operation_timeout(mut self, limit: Duration) -> Self {
        self.operation_timeout = limit;
        self
    }

    pub const fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.policy = policy;
        self.faults = None;
        self
    }

    /// Publishes a [`LifecycleEvent`] on `bus` for every transition.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Takes the timeout and fault mapping from configuration.
    pub fn config(mut self, config: &LifecycleConfig) -> Self {
        self.operation_timeout = config.operation_timeout();
        self.faults = Some(config.faults);
        self
    }

    /// # Errors
    /// Returns [`LifecycleError::InvalidConfiguration`] for a zero timeout and
    /// [`LifecycleError::InvalidPolicy`] for a fault mapping to a non-failure status.
    pub fn build(self) -> Result<LifecycleEngine, LifecycleError> {
        if self.operation_timeout.is_zero() {
            return Err(LifecycleError::InvalidConfiguration {
                message: "operation timeout must be greater than zero".into(),
                context: None,
            });
        }

        let policy = match &self.faults {
            Some(faults) => FaultPolicy::from_config(faults)?,
            None => self.policy,
        };

        debug!(
            modules = self.catalog.len(),
            timeout = ?self.operation_timeout,
            events = self.bus.is_some(),
            "Lifecycle engine ready"
        );

        Ok(LifecycleEngine {
            shared: Arc::new(Shared {
                catalog: self.catalog,
                policy,
                operation_timeout: self.operation_timeout,
                bus: self.bus,
                gate: Mutex::new(()),
                flags: watch::Sender::new(LifecycleFlags::empty()),
                status: watch::Sender::new(ModuleStatus::Unloaded),
                active: watch::Sender::new(None),
                counters: Counters::default(),
            }),
        })
    }
}
