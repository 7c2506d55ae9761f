use mstone_domain::Route;
use mstone_event_bus::EventBus;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{trace, warn};

/// Routing surface of the UI layer.
pub trait Navigator: Debug + Send + Sync + 'static {
    /// Shows `route` on top of the current history.
    fn navigate_to(&self, route: Route);

    /// Shows the home screen and clears the history.
    fn navigate_home(&self);
}

/// A routing instruction for the UI-affine consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationCommand {
    pub route: Route,
    /// Drop the back stack before showing `route`.
    pub clear_history: bool,
}

impl NavigationCommand {
    #[must_use]
    pub const fn push(route: Route) -> Self {
        Self { route, clear_history: false }
    }

    #[must_use]
    pub const fn home() -> Self {
        Self { route: Route::Home, clear_history: true }
    }
}

/// Forwards navigation over the event bus MPSC queue of [`NavigationCommand`].
///
/// The UI host takes the single receiver with
/// `bus.subscribe_mpsc::<NavigationCommand>(capacity)` and applies commands in order.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    bus: EventBus,
}

impl ChannelNavigator {
    #[must_use]
    pub const fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    fn send(&self, command: NavigationCommand) {
        trace!(route = %command.route, clear_history = command.clear_history, "Navigation queued");
        if let Err(err) = self.bus.publish_mpsc(command) {
            warn!(error = %err, "Navigation command dropped");
        }
    }
}

impl Navigator for ChannelNavigator {
    fn navigate_to(&self, route: Route) {
        self.send(NavigationCommand::push(route));
    }

    fn navigate_home(&self) {
        self.send(NavigationCommand::home());
    }
}
