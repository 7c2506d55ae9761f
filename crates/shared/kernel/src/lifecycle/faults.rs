use super::LifecycleError;
use crate::processor::FaultKind;
use mstone_domain::ModuleStatus;
use mstone_domain::config::FaultPolicyConfig;

/// Maps processor fault kinds to the status observers see.
///
/// The mapping doubles as retry policy: the coordinator retries on some statuses only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPolicy {
    io: ModuleStatus,
    timeout: ModuleStatus,
    illegal_state: ModuleStatus,
    missing_resource: ModuleStatus,
    panic: ModuleStatus,
    unknown: ModuleStatus,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        let defaults = FaultPolicyConfig::default();
        Self {
            io: defaults.io,
            timeout: defaults.timeout,
            illegal_state: defaults.illegal_state,
            missing_resource: defaults.missing_resource,
            panic: defaults.panic,
            unknown: defaults.unknown,
        }
    }
}

impl FaultPolicy {
    /// # Errors
    /// Returns [`LifecycleError::InvalidPolicy`] if any entry is not a failure status.
    pub fn from_config(config: &FaultPolicyConfig) -> Result<Self, LifecycleError> {
        Self::default()
            .with(FaultKind::Io, config.io)?
            .with(FaultKind::Timeout, config.timeout)?
            .with(FaultKind::IllegalState, config.illegal_state)?
            .with(FaultKind::MissingResource, config.missing_resource)?
            .with(FaultKind::Panic, config.panic)?
            .with(FaultKind::Unknown, config.unknown)
    }

    /// Overrides the status for one kind.
    ///
    /// # Errors
    /// Returns [`LifecycleError::InvalidPolicy`] unless `status` is `Failed`, `Error`,
    /// `Crashed` or `Invalid`.
    pub fn with(mut self, kind: FaultKind, status: ModuleStatus) -> Result<Self, LifecycleError> {
        if !status.is_failure() {
            return Err(LifecycleError::InvalidPolicy {
                message: format!("'{kind}' faults cannot map to '{status}'").into(),
                context: None,
            });
        }
        *self.slot(kind) = status;
        Ok(self)
    }

    #[must_use]
    pub const fn classify(&self, kind: FaultKind) -> ModuleStatus {
        match kind {
            FaultKind::Io => self.io,
            FaultKind::Timeout => self.timeout,
            FaultKind::IllegalState => self.illegal_state,
            FaultKind::MissingResource => self.missing_resource,
            FaultKind::Panic => self.panic,
            FaultKind::Unknown => self.unknown,
        }
    }

    const fn slot(&mut self, kind: FaultKind) -> &mut ModuleStatus {
        match kind {
            FaultKind::Io => &mut self.io,
            FaultKind::Timeout => &mut self.timeout,
            FaultKind::IllegalState => &mut self.illegal_state,
            FaultKind::MissingResource => &mut self.missing_resource,
            FaultKind::Panic => &mut self.panic,
            FaultKind::Unknown => &mut self.unknown,
        }
    }
}
