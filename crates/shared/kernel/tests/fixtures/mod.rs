#![allow(dead_code)]

use mstone_kernel::catalog::ModuleCatalog;
use mstone_kernel::coordinator::{NavigationCommand, Navigator, RequestCoordinator, RetryPolicy};
use mstone_kernel::lifecycle::LifecycleEngine;
use mstone_kernel::processor::{FaultKind, ModuleProcessor, ProcessorFault};
use mstone_kernel::registry::FeatureRegistry;
use mstone_domain::Route;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a scripted hook does when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Decline,
    Fault(FaultKind),
    Panic,
    /// Blocks the calling thread, then succeeds.
    Stall(Duration),
}

/// A processor whose hooks follow a script, falling back to a default step.
#[derive(Debug)]
pub struct FakeProcessor {
    init_script: Mutex<VecDeque<Step>>,
    cleanup_script: Mutex<VecDeque<Step>>,
    init_default: Step,
    cleanup_default: Step,
    init_calls: AtomicUsize,
    cleanup_calls: AtomicUsize,
}

impl FakeProcessor {
    pub fn healthy() -> Arc<Self> {
        Self::with_defaults(Step::Succeed, Step::Succeed)
    }

    pub fn always(init: Step) -> Arc<Self> {
        Self::with_defaults(init, Step::Succeed)
    }

    pub fn with_defaults(init: Step, cleanup: Step) -> Arc<Self> {
        Arc::new(Self {
            init_script: Mutex::new(VecDeque::new()),
            cleanup_script: Mutex::new(VecDeque::new()),
            init_default: init,
            cleanup_default: cleanup,
            init_calls: AtomicUsize::new(0),
            cleanup_calls: AtomicUsize::new(0),
        })
    }

    /// Queues steps for the next `initialize` calls.
    pub fn script_init(&self, steps: impl IntoIterator<Item = Step>) {
        self.init_script.lock().extend(steps);
    }

    pub fn script_cleanup(&self, steps: impl IntoIterator<Item = Step>) {
        self.cleanup_script.lock().extend(steps);
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn cleanup_calls(&self) -> usize {
        self.cleanup_calls.load(Ordering::SeqCst)
    }

    fn perform(step: Step) -> Result<bool, ProcessorFault> {
        match step {
            Step::Succeed => Ok(true),
            Step::Decline => Ok(false),
            Step::Fault(kind) => Err(fault(kind)),
            Step::Panic => panic!("scripted processor panic"),
            Step::Stall(delay) => {
                std::thread::sleep(delay);
                Ok(true)
            },
        }
    }
}

impl ModuleProcessor for FakeProcessor {
    fn name(&self) -> &str {
        "fake"
    }

    fn initialize(&self) -> Result<bool, ProcessorFault> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.init_script.lock().pop_front().unwrap_or(self.init_default);
        Self::perform(step)
    }

    fn cleanup(&self) -> Result<bool, ProcessorFault> {
        self.cleanup_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.cleanup_script.lock().pop_front().unwrap_or(self.cleanup_default);
        Self::perform(step)
    }
}

/// Builds the fault a real processor would raise for `kind`.
pub fn fault(kind: FaultKind) -> ProcessorFault {
    match kind {
        FaultKind::Io => std::io::Error::other("scripted I/O failure").into(),
        FaultKind::Timeout => ProcessorFault::Timeout { message: "scripted".into(), context: None },
        FaultKind::IllegalState => {
            ProcessorFault::IllegalState { message: "scripted".into(), context: None }
        },
        FaultKind::MissingResource => {
            ProcessorFault::MissingResource { message: "scripted".into(), context: None }
        },
        FaultKind::Panic => ProcessorFault::Panicked { message: "scripted".into(), context: None },
        FaultKind::Unknown => ProcessorFault::from("scripted"),
    }
}

/// Navigator that records every command.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    commands: Mutex<Vec<NavigationCommand>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn commands(&self) -> Vec<NavigationCommand> {
        self.commands.lock().clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.commands.lock().iter().map(|c| c.route.to_string()).collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: Route) {
        self.commands.lock().push(NavigationCommand::push(route));
    }

    fn navigate_home(&self) {
        self.commands.lock().push(NavigationCommand::home());
    }
}

/// Engine over the standard catalog with `tools` as `Module01`.
pub fn engine_with(tools: Arc<FakeProcessor>) -> LifecycleEngine {
    engine_with_timeout(tools, Duration::from_millis(500))
}

pub fn engine_with_timeout(tools: Arc<FakeProcessor>, limit: Duration) -> LifecycleEngine {
    LifecycleEngine::builder()
        .catalog(ModuleCatalog::standard(tools))
        .operation_timeout(limit)
        .build()
        .expect("engine should build")
}

pub fn coordinator_with(
    engine: LifecycleEngine,
    navigator: Arc<RecordingNavigator>,
    policy: RetryPolicy,
) -> Arc<RequestCoordinator> {
    Arc::new(RequestCoordinator::new(engine, FeatureRegistry::standard(), navigator, policy))
}
