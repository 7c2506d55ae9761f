use super::Operation;
use super::engine::{Shared, SlotUpdate};
use mstone_domain::{LifecycleFlags, ModuleId, ModuleStatus};
use tracing::{error, trace};

/// Exclusive right to run one lifecycle operation.
///
/// Taken by compare-and-set from the empty flag set, so at most one bit is ever set.
/// Dropping the claim clears the flags. A claim dropped before [`Claim::settle`] marks
/// the operation as `Error` first, so the flags never clear over a transient status.
pub(super) struct Claim<'a> {
    shared: &'a Shared,
    module: ModuleId,
    operation: Operation,
    settled: bool,
}

impl<'a> Claim<'a> {
    pub(super) fn acquire(
        shared: &'a Shared,
        operation: Operation,
        module: &ModuleId,
    ) -> Option<Self> {
        let flag = operation.flag();
        let won = shared.flags.send_if_modified(|flags| {
            if flags.is_empty() {
                *flags = flag;
                true
            } else {
                false
            }
        });

        won.then(|| {
            trace!(%module, %operation, "Lifecycle claim acquired");
            Self { shared, module: module.clone(), operation, settled: false }
        })
    }

    /// Marks the final status as published; dropping now only releases the flags.
    pub(super) fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            error!(
                module = %self.module,
                operation = %self.operation,
                "Lifecycle operation abandoned before settling"
            );
            self.shared.publish(&self.module, self.operation, ModuleStatus::Error, SlotUpdate::Mirror);
        }
        self.shared.flags.send_replace(LifecycleFlags::empty());
        trace!(module = %self.module, operation = %self.operation, "Lifecycle claim released");
    }
}
