//! Command-line host for the Milestone lifecycle stack.
//!
//! The shell plays the UI: it feeds feature requests to the coordinator, applies the
//! navigation commands that come back over the event bus, and keeps a back stack.

mod error;

pub use crate::error::{ShellError, ShellErrorExt};

use clap::Parser;
use mstone::Platform;
use mstone::domain::config::LoggingConfig;
use mstone::domain::{FeatureId, ModuleStatus, Route};
use mstone::kernel::coordinator::{NavigationCommand, TaskOutcome};
use mstone_logger::{Logger, parse_level};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Prefix of rolling log files.
const LOG_NAME: &str = "milestone";

/// Command-line arguments of the `milestone` binary.
#[derive(Debug, Parser)]
#[command(name = "milestone")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drives feature module requests through the lifecycle coordinator")]
pub struct Cli {
    /// Config file; `milestone.toml` in the working directory when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overrides `logging.level` from the config
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Steps to run in order: `request:FEATURE`, `release:FEATURE` or a bare `FEATURE`
    #[arg(required = true)]
    pub steps: Vec<Step>,
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Request(FeatureId),
    Release(FeatureId),
}

impl FromStr for Step {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, feature) = s.split_once(':').unwrap_or(("request", s));
        let feature = feature.trim();
        if feature.is_empty() {
            return Err(ShellError::InvalidStep { message: s.to_owned().into(), context: None });
        }

        match verb.trim() {
            "request" => Ok(Self::Request(FeatureId::new(feature))),
            "release" => Ok(Self::Release(FeatureId::new(feature))),
            other => Err(ShellError::InvalidStep {
                message: format!("unknown action '{other}'").into(),
                context: Some(s.to_owned().into()),
            }),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(feature) => write!(f, "request:{feature}"),
            Self::Release(feature) => write!(f, "release:{feature}"),
        }
    }
}

/// Screen history of the UI host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackStack {
    routes: Vec<Route>,
}

impl Default for BackStack {
    fn default() -> Self {
        Self { routes: vec![Route::Home] }
    }
}

impl BackStack {
    pub fn apply(&mut self, command: &NavigationCommand) {
        if command.clear_history {
            self.routes.clear();
        }
        self.routes.push(command.route.clone());
    }

    /// The route on screen.
    #[must_use]
    pub fn current(&self) -> &Route {
        self.routes.last().unwrap_or(&Route::Home)
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.routes.len()
    }
}

/// What one step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub status: ModuleStatus,
    /// Load attempts made; zero for releases and reused modules.
    pub attempts: u32,
    pub screen: Route,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<20} {:<10} attempts={} screen={}", self.step, self.status, self.attempts, self.screen)
    }
}

/// Installs the global subscriber from the logging section, with an optional level override.
///
/// # Errors
/// Returns [`ShellError::Logger`] for an unknown level or a rejected subscriber setup.
pub fn init_logger(config: &LoggingConfig, level: Option<&str>) -> Result<Logger, ShellError> {
    let level = parse_level(level.unwrap_or(&config.level))?;

    let mut builder =
        Logger::builder().name(LOG_NAME).level(level).console(config.console).json(config.json);
    if let Some(path) = &config.path {
        builder = builder.path(path);
    }
    if let Some(filter) = &config.env_filter {
        builder = builder.env_filter(filter);
    }

    builder.init().context("shell logger")
}

/// Drives `steps` through the platform one at a time, applying navigation after each.
///
/// # Errors
/// Returns [`ShellError::Internal`] if the navigation queue was already taken.
pub async fn run(platform: &Platform, steps: &[Step]) -> Result<(BackStack, Vec<StepReport>), ShellError> {
    let mut queue = platform.take_navigation().ok_or("navigation queue already taken")?;
    let coordinator = platform.coordinator();
    let mut stack = BackStack::default();
    let mut reports = Vec::with_capacity(steps.len());

    for step in steps {
        match step {
            Step::Request(feature) => coordinator.spawn_request(feature.clone()),
            Step::Release(feature) => coordinator.spawn_release(feature.clone()),
        };

        let (status, attempts) = match coordinator.drain().await.pop() {
            Some(TaskOutcome::Request { outcome, .. }) => (outcome.status, outcome.attempts),
            Some(TaskOutcome::Release { status, .. }) => (status, 0),
            None => (platform.engine().current_status(), 0),
        };

        apply_pending(&mut queue, &mut stack);
        info!(%step, %status, attempts, screen = %stack.current(), "Step finished");
        reports.push(StepReport { step: step.clone(), status, attempts, screen: stack.current().clone() });
    }

    Ok((stack, reports))
}

fn apply_pending(queue: &mut mpsc::Receiver<Arc<NavigationCommand>>, stack: &mut BackStack) {
    while let Ok(command) = queue.try_recv() {
        debug!(route = %command.route, clear_history = command.clear_history, "Navigating");
        stack.apply(&command);
    }
}
