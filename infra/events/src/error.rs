use std::borrow::Cow;

/// Errors that can occur during event bus operations.
#[mstone_derive::mstone_error]
pub enum EventBusError {
    /// An internal downcast failed; the type registry invariant was violated.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The event type is already bound to a different channel kind.
    #[error("Channel kind mismatch{}: {message}", format_context(.context))]
    ChannelKindMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A bounded channel cannot accept more messages right now.
    #[error("Channel full{}: {message}", format_context(.context))]
    ChannelFull { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The consuming side of the channel is gone.
    #[error("Channel closed{}: {message}", format_context(.context))]
    ChannelClosed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The single MPSC receiver was already handed out.
    #[error("Receiver taken{}: {message}", format_context(.context))]
    ReceiverTaken { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Capacity must be greater than zero for bounded channels.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
