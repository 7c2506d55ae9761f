//! # Module lifecycle
//!
//! [`LifecycleEngine`] owns the single active-module slot. It loads and unloads modules
//! from the [`ModuleCatalog`](crate::catalog::ModuleCatalog) one operation at a time.
//!
//! * **Fail-fast exclusion**: an operation claims [`LifecycleFlags`] with a compare-and-set
//!   from the empty set. Callers that find a claim in place get `Failed` right away.
//! * **Swap on load**: loading while a module is active unloads it first, inside the same claim.
//! * **Bounded**: every critical section runs under the operation timeout; expiry is `Error`.
//! * **Guaranteed release**: the claim is an RAII guard, so success, faults, timeouts, panics
//!   and dropped futures all clear the flags, and always after the final status is published.
//!
//! Observers follow the engine through `watch` receivers (latest value, replayed on
//! subscribe) and, when an [`EventBus`](mstone_event_bus::EventBus) is attached, through
//! [`LifecycleEvent`] broadcasts.
//!
//! [`LifecycleFlags`]: mstone_domain::LifecycleFlags

mod engine;
mod faults;
mod guard;

pub use engine::{LifecycleEngine, LifecycleEngineBuilder};
pub use faults::FaultPolicy;

use mstone_domain::{LifecycleFlags, ModuleId, ModuleStatus};
use serde::Serialize;
use std::borrow::Cow;
use strum::{AsRefStr, Display};

#[mstone_derive::mstone_error]
pub enum LifecycleError {
    /// A fault policy entry maps to a non-failure status.
    #[error("Invalid fault policy{}: {message}", format_context(.context))]
    InvalidPolicy { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid lifecycle configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// The two lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    Load,
    Unload,
}

impl Operation {
    /// The flag this operation claims.
    #[must_use]
    pub const fn flag(self) -> LifecycleFlags {
        match self {
            Self::Load => LifecycleFlags::LOADING,
            Self::Unload => LifecycleFlags::UNLOADING,
        }
    }

    #[must_use]
    pub const fn transient_status(self) -> ModuleStatus {
        match self {
            Self::Load => ModuleStatus::Loading,
            Self::Unload => ModuleStatus::Unloading,
        }
    }

    #[must_use]
    pub const fn terminal_status(self) -> ModuleStatus {
        match self {
            Self::Load => ModuleStatus::Success,
            Self::Unload => ModuleStatus::Unloaded,
        }
    }
}

/// One published status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleEvent {
    pub module: ModuleId,
    pub operation: Operation,
    pub status: ModuleStatus,
}

/// Operation counters since the engine was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleStats {
    /// Load operations that won the claim.
    pub loads: u64,
    /// Explicit unload operations that won the claim.
    pub unloads: u64,
    /// Unloads performed inside a load to make room for the new module.
    pub swaps: u64,
    /// Operations turned away because another one held the claim.
    pub rejected: u64,
}
