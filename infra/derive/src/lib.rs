#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the Milestone crates.
//!
//! * [`macro@main`] bootstraps an `async fn main` on a [`mstone_runtime`] profile.
//! * [`macro@mstone_error`] turns an enum into a `thiserror` error with context support.
//!
//! Examples are `ignore`d here because the generated code refers to crates this
//! proc-macro crate cannot depend on; the consuming crates carry the real tests.
//!
//! [`mstone_runtime`]: https://docs.rs/mstone-runtime

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro to bootstrap a Milestone Tokio runtime.
///
/// Turns an `async fn main` returning a `Result` into a plain `fn main` that builds
/// the runtime described by the selected profile and blocks on the body.
///
/// # Arguments
///
/// * `ui_affine` - Current-thread scheduler; every task stays on the calling thread.
/// * `background` - Multi-threaded scheduler sized for background work.
/// * `default` (or no argument) - Multi-threaded scheduler with detected parallelism.
///
/// # Examples
///
/// ```rust,ignore
/// #[mstone_runtime::main(ui_affine)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for domain error enums.
///
/// # Features
///
/// * Injects `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * Generates a companion `<Name>Ext` trait with `.context(...)` for
///   `Result<T, Name>` and for `Result<T, Source>` of every variant that wraps a source.
/// * Implements `From<Source>` for variants with a `source` (or `#[source]`/`#[from]`) field.
/// * Implements `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * Provides a private `format_context` helper for `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Only enums are accepted.
/// 2. Every variant uses named fields.
/// 3. A variant with a source must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[mstone_derive::mstone_error]
/// pub enum ToolError {
///     #[error("Tool I/O error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal tool error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn open() -> Result<(), ToolError> {
///     std::fs::read("model.bin").context("Reading OCR model")?;
///     Err("not wired yet".into())
/// }
/// ```
#[proc_macro_attribute]
pub fn mstone_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
