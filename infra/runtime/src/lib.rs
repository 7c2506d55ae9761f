//! # Runtime
//!
//! Standardized [Tokio](https://tokio.rs) runtime profiles for the Milestone binaries.
//!
//! ## Profiles
//! * **UI affine**: a current-thread scheduler. Every task, including navigation
//!   callbacks, runs on the thread that called [`build_runtime_with_config`].
//! * **Background**: a multithreaded scheduler for work that has no thread affinity.
//! * **Default**: a multithreaded scheduler sized from the host.
//!
//! There is deliberately no process-wide runtime: binaries build one at their
//! composition root and pass handles down.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[mstone_runtime::main(ui_affine)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use mstone_derive::main;

use anyhow::anyhow;
use std::{thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// The default stack size for threads (2 `MiB`).
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
/// Minimum allowed stack size (1 `MiB`).
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
/// How long an idle thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Which Tokio scheduler the runtime uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// All tasks are driven by the thread that blocks on the runtime.
    CurrentThread,
    /// Work-stealing pool of worker threads.
    MultiThread,
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub flavor: Flavor,
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

/// Detects the number of worker threads from `TOKIO_WORKER_THREADS` or the hardware.
fn detect_worker_threads() -> usize {
    std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0 && n <= 1024)
        .unwrap_or_else(|| {
            available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
        })
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flavor: Flavor::MultiThread,
            worker_threads: detect_worker_threads(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "mstone-worker".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl RuntimeConfig {
    /// Preset for the UI host: a single cooperative scheduler on the calling thread.
    ///
    /// Blocking-pool threads still exist for `spawn_blocking`; they inherit the
    /// stack size and keep-alive settings.
    #[must_use = "Use this configuration for the UI-affine host runtime"]
    pub fn ui_affine() -> Self {
        Self {
            flavor: Flavor::CurrentThread,
            worker_threads: 1,
            thread_name: "mstone-ui".to_owned(),
            thread_keep_alive: Duration::from_secs(10),
            ..Self::default()
        }
    }

    /// Preset for background processing with half of the detected parallelism.
    #[must_use = "Use this configuration for background processing"]
    pub fn background() -> Self {
        Self {
            worker_threads: (detect_worker_threads() / 2).max(1),
            thread_name: "mstone-bg".to_owned(),
            thread_keep_alive: Duration::from_secs(30),
            ..Self::default()
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, 1024);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name = if name.trim().is_empty() { "mstone-worker".to_owned() } else { name };
        self
    }

    #[must_use = "Customize the scheduler flavor"]
    pub const fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    fn normalized(&self) -> Self {
        self.clone()
            .with_worker_threads(self.worker_threads)
            .with_stack_size(self.stack_size)
            .with_thread_name(self.thread_name.clone())
    }
}

/// Creates a Tokio runtime from a [`RuntimeConfig`], with I/O and timers enabled.
///
/// Out-of-range values are clamped rather than rejected.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
///
/// # Examples
///
/// ```rust
/// use mstone_runtime::{build_runtime_with_config, RuntimeConfig};
///
/// let runtime = build_runtime_with_config(&RuntimeConfig::ui_affine())?;
/// let answer = runtime.block_on(async { 42 });
/// assert_eq!(answer, 42);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(config = ?config, "Building tokio runtime");

    let mut builder = match config.flavor {
        Flavor::CurrentThread => Builder::new_current_thread(),
        Flavor::MultiThread => {
            let mut builder = Builder::new_multi_thread();
            builder.worker_threads(config.worker_threads);
            builder
        },
    };

    builder
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all();

    builder.build().map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_threads_validation() {
        let config = RuntimeConfig::default().with_worker_threads(0);
        assert_eq!(config.worker_threads, 1);

        let config = RuntimeConfig::default().with_worker_threads(2000);
        assert_eq!(config.worker_threads, 1024);
    }

    #[test]
    fn test_stack_size_validation() {
        let config = RuntimeConfig::default().with_stack_size(100);
        assert_eq!(config.stack_size, MIN_STACK_SIZE);

        let config = RuntimeConfig::default().with_stack_size(100 * 1024 * 1024);
        assert_eq!(config.stack_size, MAX_STACK_SIZE);
    }

    #[test]
    fn test_ui_affine_is_current_thread() {
        let config = RuntimeConfig::ui_affine();
        assert_eq!(config.flavor, Flavor::CurrentThread);
        assert_eq!(config.thread_name, "mstone-ui");
    }

    #[test]
    fn test_ui_affine_runs_spawned_tasks_on_calling_thread() -> Result<()> {
        let runtime = build_runtime_with_config(&RuntimeConfig::ui_affine())?;
        let caller = std::thread::current().id();

        let observed = runtime.block_on(async {
            let local = tokio::task::spawn(async { std::thread::current().id() });
            local.await
        })?;

        assert_eq!(observed, caller);
        Ok(())
    }

    #[test]
    fn test_blank_thread_name_falls_back() {
        let config = RuntimeConfig::background().with_thread_name("   ");
        assert_eq!(config.thread_name, "mstone-worker");
        assert_eq!(config.flavor, Flavor::MultiThread);
    }
}
