use mstone::PlatformError;
use mstone_logger::LoggerError;
use std::borrow::Cow;

#[mstone_derive::mstone_error]
pub enum ShellError {
    /// A step argument that is not `request:F`, `release:F` or `F`.
    #[error("Invalid step{}: {message}", format_context(.context))]
    InvalidStep { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Logger error{}: {source}", format_context(.context))]
    Logger { source: LoggerError, context: Option<Cow<'static, str>> },

    #[error("Platform error{}: {source}", format_context(.context))]
    Platform { source: PlatformError, context: Option<Cow<'static, str>> },

    #[error("Internal shell error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
