use mstone_event_bus::EventBusError;
use mstone_kernel::config::ConfigError;
use mstone_kernel::lifecycle::LifecycleError;
use mstone_kernel::registry::RegistryError;
use std::borrow::Cow;

/// Errors raised while assembling a [`Platform`](crate::Platform).
#[mstone_derive::mstone_error]
pub enum PlatformError {
    #[error("Configuration error{}: {source}", format_context(.context))]
    Config { source: ConfigError, context: Option<Cow<'static, str>> },

    #[error("Feature registry error{}: {source}", format_context(.context))]
    Registry { source: RegistryError, context: Option<Cow<'static, str>> },

    #[error("Lifecycle engine error{}: {source}", format_context(.context))]
    Lifecycle { source: LifecycleError, context: Option<Cow<'static, str>> },

    #[error("Event bus error{}: {source}", format_context(.context))]
    Events { source: EventBusError, context: Option<Cow<'static, str>> },

    #[error("Internal platform error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
