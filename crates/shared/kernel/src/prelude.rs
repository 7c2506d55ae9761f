pub use crate::catalog::{CatalogEntry, ModuleCatalog};
pub use crate::coordinator::{
    ChannelNavigator, NavigationCommand, Navigator, RequestCoordinator, RequestOutcome,
    RetryPolicy, TaskOutcome,
};
pub use crate::lifecycle::{
    FaultPolicy, LifecycleEngine, LifecycleError, LifecycleEvent, LifecycleStats, Operation,
};
pub use crate::processor::{FaultKind, ModuleProcessor, ProcessorFault};
pub use crate::registry::{FeatureRegistry, RegistryError};
pub use mstone_domain::config::{AppConfig, ReusePolicy};
pub use mstone_domain::{ActiveModuleInfo, FeatureId, LifecycleFlags, ModuleId, ModuleStatus, Route};
