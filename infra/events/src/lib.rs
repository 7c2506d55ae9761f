//! # Event Bus
//!
//! A type-keyed, asynchronous event bus shared by the Milestone crates.
//!
//! ## Overview
//!
//! One [`EventBus`] connects decoupled components: the lifecycle engine broadcasts
//! module transitions, the request coordinator queues navigation commands for the
//! UI-affine consumer.
//!
//! * **Type-Safe**: events are identified by their Rust type.
//! * **Channel choice**: broadcast (fan-out) or MPSC (single-consumer queue).
//! * **Cheap to share**: clones share the same `FxHashMap` behind a `parking_lot::RwLock`.
//!
//! # Example
//!
//! ```rust
//! use mstone_event_bus::{EventBus, EventBusError, EventReceiverExt};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Navigate(&'static str);
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let mut rx = bus.subscribe_mpsc::<Navigate>(8)?;
//!     bus.publish_mpsc(Navigate("home_screen"))?;
//!
//!     assert_eq!(rx.recv().await.map(|n| n.0), Some("home_screen"));
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{ChannelKind, Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
