//! `mms-middleware` – event routing.
//!
//! Carries display-only and diagnostic traffic from the simulator core to
//! whoever is watching (a renderer, a logger, a test) without the core
//! knowing who that is.
//!
//! # Modules
//!
//! - [`bus`] – Headless, topic-based publish/subscribe event bus built on
//!   Tokio broadcast channels.

pub mod bus;

pub use bus::{EventBus, Topic, TopicReceiver};
