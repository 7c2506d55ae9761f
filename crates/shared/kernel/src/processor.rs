//! The contract every loadable module implements.

use std::borrow::Cow;
use std::fmt::Debug;
use strum::{AsRefStr, Display, EnumIter};

/// Class of a processor fault, used to pick the reported status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum FaultKind {
    Io,
    Timeout,
    IllegalState,
    MissingResource,
    Panic,
    Unknown,
}

/// A fault raised while a module initializes or releases its resources.
#[mstone_derive::mstone_error]
pub enum ProcessorFault {
    #[error("I/O fault{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Timed out{}: {message}", format_context(.context))]
    Timeout { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The processor was asked to do something its current state forbids.
    #[error("Illegal state{}: {message}", format_context(.context))]
    IllegalState { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A model, file or handle the processor depends on is absent.
    #[error("Missing resource{}: {message}", format_context(.context))]
    MissingResource { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The processor panicked; raised by the engine, not by processors.
    #[error("Processor panicked{}: {message}", format_context(.context))]
    Panicked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal processor fault{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ProcessorFault {
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::Io { .. } => FaultKind::Io,
            Self::Timeout { .. } => FaultKind::Timeout,
            Self::IllegalState { .. } => FaultKind::IllegalState,
            Self::MissingResource { .. } => FaultKind::MissingResource,
            Self::Panicked { .. } => FaultKind::Panic,
            Self::Internal { .. } => FaultKind::Unknown,
        }
    }
}

/// Start/stop hooks of a module.
///
/// Both hooks are synchronous and may block; the lifecycle engine runs them on the
/// blocking pool under its operation timeout. `Ok(false)` means the module declined
/// without faulting.
pub trait ModuleProcessor: Debug + Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Acquires the module's resources.
    ///
    /// # Errors
    /// Returns a [`ProcessorFault`] describing why initialization broke down.
    fn initialize(&self) -> Result<bool, ProcessorFault>;

    /// Releases the module's resources.
    ///
    /// # Errors
    /// Returns a [`ProcessorFault`] describing why the release broke down.
    fn cleanup(&self) -> Result<bool, ProcessorFault>;
}
