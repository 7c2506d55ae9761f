use std::sync::atomic::{AtomicBool, Ordering};

/// Start/stop bookkeeping shared by the individual tools.
#[derive(Debug)]
pub(crate) struct ToolCell {
    name: &'static str,
    running: AtomicBool,
}

impl ToolCell {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self { name, running: AtomicBool::new(false) }
    }

    pub(crate) const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starting a running tool is a no-op.
    pub(crate) fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            tracing::trace!(tool = self.name, "Tool already running");
        } else {
            tracing::debug!(tool = self.name, "Tool initialized");
        }
    }

    /// Releasing a stopped tool is a no-op.
    pub(crate) fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::debug!(tool = self.name, "Tool resources released");
        } else {
            tracing::trace!(tool = self.name, "Tool was not running");
        }
    }
}

/// Implements [`ModuleProcessor`](mstone_kernel::processor::ModuleProcessor) for a
/// tool that only tracks its running state.
macro_rules! stub_tool {
    ($(#[$meta:meta])* $ty:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $ty {
            cell: $crate::tool::ToolCell,
        }

        impl $ty {
            #[must_use]
            pub const fn new() -> Self {
                Self { cell: $crate::tool::ToolCell::new($name) }
            }

            #[must_use]
            pub fn is_running(&self) -> bool {
                self.cell.is_running()
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::mstone_kernel::processor::ModuleProcessor for $ty {
            fn name(&self) -> &str {
                self.cell.name()
            }

            fn initialize(&self) -> Result<bool, ::mstone_kernel::processor::ProcessorFault> {
                self.cell.start();
                Ok(true)
            }

            fn cleanup(&self) -> Result<bool, ::mstone_kernel::processor::ProcessorFault> {
                self.cell.stop();
                Ok(true)
            }
        }
    };
}

pub(crate) use stub_tool;
