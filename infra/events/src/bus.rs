use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::mem::discriminant;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tracing::{trace, warn};

/// Default buffer for broadcast and MPSC channels.
/// Lifecycle transitions and navigation commands are low-volume; 128 is plenty.
const DEFAULT_CAPACITY: usize = 128;
const MIN_CAPACITY: usize = 1;

/// Supported channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Broadcast (fan-out) semantics.
    Broadcast { capacity: usize },
    /// MPSC (queue) semantics with a single consumer.
    Mpsc { capacity: usize },
}

/// Marker trait for types that can be sent across the [`EventBus`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

#[derive(Debug)]
struct Slot {
    kind: ChannelKind,
    channel: Box<dyn Any + Send + Sync>,
}

/// An MPSC channel whose receiver is handed out at most once.
#[derive(Debug)]
struct Queue<T> {
    sender: mpsc::Sender<Arc<T>>,
    receiver: Option<mpsc::Receiver<Arc<T>>>,
}

/// A thread-safe, type-keyed event bus.
///
/// Each event type `T` owns at most one channel, identified by its [`TypeId`].
/// Clones share the same channels.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<TypeId, Slot>>>,
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to broadcast events of type `T` with the default capacity.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] if `T` is already bound to a
    /// different channel kind.
    ///
    /// # Examples
    /// ```rust
    /// use mstone_event_bus::{EventBus, EventReceiverExt};
    ///
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct ModuleLoaded(&'static str);
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), mstone_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let mut rx = bus.subscribe::<ModuleLoaded>()?;
    /// bus.publish(ModuleLoaded("Module01"))?;
    /// assert_eq!(rx.recv().await.unwrap().0, "Module01");
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<T: Event>(&self) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        self.subscribe_with_capacity::<T>(DEFAULT_CAPACITY)
    }

    /// Subscribes to broadcast events of type `T` with a specific buffer capacity.
    ///
    /// The capacity only matters for the subscriber that creates the channel.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] for a zero capacity and
    /// [`EventBusError::ChannelKindMismatch`] on a kind conflict.
    pub fn subscribe_with_capacity<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<broadcast::Receiver<Arc<T>>, EventBusError> {
        let capacity = validate_capacity(capacity)?;
        self.broadcast_sender::<T>(capacity, true).map(|tx| tx.subscribe())
    }

    /// Publishes an event to all current broadcast subscribers.
    ///
    /// Returns the number of subscribers that received it; zero is not an error.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] on a kind conflict.
    pub fn publish<T: Event>(&self, event: T) -> Result<usize, EventBusError> {
        self.publish_arc(Arc::new(event))
    }

    /// Publishes an already shared event via broadcast.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelKindMismatch`] on a kind conflict.
    pub fn publish_arc<T: Event>(&self, event: Arc<T>) -> Result<usize, EventBusError> {
        let sender = self.broadcast_sender::<T>(DEFAULT_CAPACITY, false)?;
        let delivered = sender.send(event).unwrap_or(0);
        trace!(event = type_name::<T>(), delivered, "Event dispatched");
        Ok(delivered)
    }

    /// Takes the single receiver of the MPSC queue for `T`.
    ///
    /// # Errors
    /// Returns [`EventBusError::ReceiverTaken`] if the receiver was already handed
    /// out, [`EventBusError::InvalidCapacity`] for a zero capacity, or
    /// [`EventBusError::ChannelKindMismatch`] on a kind conflict.
    pub fn subscribe_mpsc<T: Event>(
        &self,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Arc<T>>, EventBusError> {
        let capacity = validate_capacity(capacity)?;
        self.access::<T, Queue<T>, _>(
            ChannelKind::Mpsc { capacity },
            true,
            || Queue::with_capacity(capacity),
            |queue| {
                queue.receiver.take().ok_or_else(|| EventBusError::ReceiverTaken {
                    message: "MPSC receiver already taken".into(),
                    context: Some(type_name::<T>().into()),
                })
            },
        )
    }

    /// Enqueues an event on the MPSC queue for `T` without waiting.
    ///
    /// Events published before the receiver is taken are buffered.
    ///
    /// # Errors
    /// Returns [`EventBusError::ChannelFull`] when the buffer is full,
    /// [`EventBusError::ChannelClosed`] when the receiver was dropped, or
    /// [`EventBusError::ChannelKindMismatch`] on a kind conflict.
    pub fn publish_mpsc<T: Event>(&self, event: T) -> Result<(), EventBusError> {
        let sender = self.access::<T, Queue<T>, _>(
            ChannelKind::Mpsc { capacity: DEFAULT_CAPACITY },
            false,
            || Queue::with_capacity(DEFAULT_CAPACITY),
            |queue| Ok(queue.sender.clone()),
        )?;

        sender.try_send(Arc::new(event)).map_err(|err| match err {
            TrySendError::Full(_) => EventBusError::ChannelFull {
                message: "MPSC buffer is full".into(),
                context: Some(type_name::<T>().into()),
            },
            TrySendError::Closed(_) => EventBusError::ChannelClosed {
                message: "MPSC receiver was dropped".into(),
                context: Some(type_name::<T>().into()),
            },
        })
    }

    /// Whether a channel of any kind exists for `T`.
    #[must_use]
    pub fn has_channel<T: Event>(&self) -> bool {
        self.channels.read().contains_key(&TypeId::of::<T>())
    }

    /// Drops every channel. Receivers observe closure once buffered events drain.
    ///
    /// Returns the number of channels that were closed.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }

    fn broadcast_sender<T: Event>(
        &self,
        capacity: usize,
        explicit: bool,
    ) -> Result<broadcast::Sender<Arc<T>>, EventBusError> {
        self.access::<T, broadcast::Sender<Arc<T>>, _>(
            ChannelKind::Broadcast { capacity },
            explicit,
            || broadcast::channel(capacity).0,
            |tx| Ok(tx.clone()),
        )
    }

    /// Gets or creates the channel for `T` and runs `f` on it under the write lock.
    ///
    /// `f` must not block; senders are cloned out so sending happens unlocked.
    /// `explicit` marks a caller-chosen capacity, which is reported when it cannot apply.
    fn access<T: Event, C: Any + Send + Sync, R>(
        &self,
        kind: ChannelKind,
        explicit: bool,
        create: impl FnOnce() -> C,
        f: impl FnOnce(&mut C) -> Result<R, EventBusError>,
    ) -> Result<R, EventBusError> {
        let mut channels = self.channels.write();
        let slot = channels.entry(TypeId::of::<T>()).or_insert_with(|| {
            trace!(event = type_name::<T>(), ?kind, "Initializing new event channel");
            Slot { kind, channel: Box::new(create()) }
        });

        if discriminant(&slot.kind) != discriminant(&kind) {
            return Err(EventBusError::ChannelKindMismatch {
                message: format!("Expected {kind:?} but found {:?}", slot.kind).into(),
                context: Some(type_name::<T>().into()),
            });
        }
        if explicit && slot.kind != kind {
            warn!(
                event = type_name::<T>(),
                existing = ?slot.kind,
                requested = ?kind,
                "Channel already initialized with a different capacity"
            );
        }

        let channel = slot.channel.downcast_mut::<C>().ok_or_else(|| {
            EventBusError::TypeMismatch {
                message: type_name::<C>().into(),
                context: Some(type_name::<T>().into()),
            }
        })?;
        f(channel)
    }
}

impl<T> Queue<T> {
    fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self { sender, receiver: Some(receiver) }
    }
}

fn validate_capacity(capacity: usize) -> Result<usize, EventBusError> {
    if capacity < MIN_CAPACITY {
        return Err(EventBusError::InvalidCapacity {
            message: format!("capacity must be >= {MIN_CAPACITY}").into(),
            context: None,
        });
    }
    Ok(capacity)
}
