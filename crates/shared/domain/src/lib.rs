//! # Domain Models
//!
//! This crate contains pure domain types with minimal dependencies (`serde`, `bitflags`, `strum`).
//! Keep it lean: no I/O, no async, no lifecycle logic. Just identifiers, statuses, routes and
//! configuration shapes shared by the kernel, the feature crates and the shell.

#[macro_use]
mod ident;

pub mod config;
pub mod constants;
pub mod features;
pub mod module;
pub mod route;

pub use features::FeatureId;
pub use module::{ActiveModuleInfo, LifecycleFlags, ModuleId, ModuleStatus};
pub use route::Route;
