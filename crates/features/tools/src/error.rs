use std::borrow::Cow;

/// A specialized [`ToolError`] enum of this crate.
#[mstone_derive::mstone_error]
pub enum ToolError {
    /// A tool bundle that cannot be driven as one module.
    #[error("Invalid tool bundle{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal tool error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
