//! Kernel of the Milestone platform.
//!
//! Keeps the moving parts of module lifecycle coordination in one place:
//!
//! * [`registry`] maps features to the modules that implement them.
//! * [`processor`] and [`catalog`] describe which modules exist and how they start and stop.
//! * [`lifecycle`] owns the single active-module slot and serializes load/unload work.
//! * [`coordinator`] turns navigation requests into lifecycle calls with bounded retries.
//!
//! ## Example
//! ```rust
//! use mstone_kernel::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = ModuleCatalog::builder().placeholders(1..=13).build();
//! let engine = LifecycleEngine::builder().catalog(catalog).build()?;
//!
//! assert_eq!(engine.load(&ModuleId::numbered(2)).await, ModuleStatus::Success);
//! assert_eq!(engine.unload(&ModuleId::numbered(2)).await, ModuleStatus::Unloaded);
//! assert!(engine.active_module().is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ## Config loading
//! ```rust,ignore
//! use mstone_kernel::config::load_config;
//! use mstone_kernel::domain::config::AppConfig;
//!
//! let cfg: AppConfig = load_config(Some("milestone.toml"))?;
//! ```

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod lifecycle;
pub mod prelude;
pub mod processor;
pub mod registry;

pub use mstone_domain as domain;
