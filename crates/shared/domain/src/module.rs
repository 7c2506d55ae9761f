use crate::constants::MODULE_01;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

string_id! {
    /// A loadable code bundle that implements one or more features (e.g. `"Module01"`).
    ModuleId
}

impl ModuleId {
    /// Builds the conventional `ModuleNN` identifier.
    ///
    /// ```
    /// use mstone_domain::ModuleId;
    /// assert_eq!(ModuleId::numbered(7).as_str(), "Module07");
    /// ```
    #[must_use]
    pub fn numbered(number: u8) -> Self {
        Self::new(format!("Module{number:02}"))
    }

    /// The module that bundles the product tools.
    #[must_use]
    pub fn tools() -> Self {
        Self::new(MODULE_01)
    }
}

/// Status of the module lifecycle, as seen by observers.
///
/// `Loading` and `Unloading` are transient; everything else is settled.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModuleStatus {
    /// The requested module is not known to the catalog.
    Invalid,
    Loading,
    Unloading,
    #[default]
    Unloaded,
    Success,
    /// The module declined, or the engine was busy.
    Failed,
    /// The module faulted in an unrecoverable way.
    Crashed,
    /// The operation timed out, was cancelled, or hit an illegal state.
    Error,
}

impl ModuleStatus {
    /// An operation is in flight.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Loading | Self::Unloading)
    }

    #[must_use]
    pub const fn is_settled(self) -> bool {
        !self.is_transient()
    }

    /// The last operation reached its intended terminal state.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::Unloaded)
    }

    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Invalid | Self::Failed | Self::Crashed | Self::Error)
    }
}

/// The single active-module slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveModuleInfo {
    pub module: ModuleId,
    pub status: ModuleStatus,
}

impl ActiveModuleInfo {
    #[must_use]
    pub const fn new(module: ModuleId, status: ModuleStatus) -> Self {
        Self { module, status }
    }

    /// Whether this slot holds `module` in a loaded state.
    #[must_use]
    pub fn is_loaded(&self, module: &ModuleId) -> bool {
        self.status == ModuleStatus::Success && &self.module == module
    }
}

bitflags! {
    /// Operations currently holding the lifecycle claim.
    ///
    /// At most one bit is ever set; a claim is only taken from the empty set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LifecycleFlags: u8 {
        const LOADING = 1 << 0;
        const UNLOADING = 1 << 1;
    }
}

impl LifecycleFlags {
    /// No operation in progress.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        self.is_empty()
    }

    /// Status that observers see while this operation runs.
    #[must_use]
    pub fn transient_status(self) -> Option<ModuleStatus> {
        if self == Self::LOADING {
            Some(ModuleStatus::Loading)
        } else if self == Self::UNLOADING {
            Some(ModuleStatus::Unloading)
        } else {
            None
        }
    }
}
