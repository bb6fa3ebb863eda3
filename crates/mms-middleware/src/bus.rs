//! Headless, topic-based publish/subscribe event bus.
//!
//! One [`tokio::sync::broadcast`] channel per topic: each subscriber gets its
//! own copy of every event and a slow one only loses its own backlog.
//! `publish_to` is a plain function call that never waits, so the
//! synchronous motion loops can emit events mid-move.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Overlay`] | Tile colors, declared walls, fog, tile text |
//! | [`Topic::Telemetry`] | Pose snapshots |
//! | [`Topic::SystemAlerts`] | Crashes, interface mode violations |

use mms_types::{Event, MmsError};
use tokio::sync::broadcast;
use tracing::warn;

/// Events buffered per topic before a lagging subscriber starts losing the
/// oldest ones.
const DEFAULT_CAPACITY: usize = 256;

/// Routing topics of the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Display-only maze annotations requested by the algorithm.
    Overlay,
    /// Periodic pose data.
    Telemetry,
    /// Run-level alerts: crashes, mode violations.
    SystemAlerts,
}

/// Handle to the simulator's channels. Clones publish into and subscribe to
/// the same topics.
#[derive(Clone, Debug)]
pub struct EventBus {
    overlay: broadcast::Sender<Event>,
    telemetry: broadcast::Sender<Event>,
    system_alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus. `capacity` applies to every topic independently.
    pub fn new(capacity: usize) -> Self {
        let (overlay, _) = broadcast::channel(capacity);
        let (telemetry, _) = broadcast::channel(capacity);
        let (system_alerts, _) = broadcast::channel(capacity);
        Self {
            overlay,
            telemetry,
            system_alerts,
        }
    }

    /// Publish `event` to `topic`.
    ///
    /// Returns the number of receivers handed the event.
    ///
    /// # Errors
    ///
    /// Returns [`MmsError::Channel`] when nobody is subscribed to the topic.
    /// Publishers that only feed optional observers ignore it.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, MmsError> {
        self.topic_sender(topic)
            .send(event)
            .map_err(|_| MmsError::Channel(format!("no subscribers for topic {topic:?}")))
    }

    /// Subscribe to a single topic.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topic_sender(topic).receiver_count()
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Overlay => &self.overlay,
            Topic::Telemetry => &self.telemetry,
            Topic::SystemAlerts => &self.system_alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic receiver
// ---------------------------------------------------------------------------

/// A receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns `Err(Lagged(n))` when the subscriber fell behind and `n`
    /// messages were dropped, and `Err(Closed)` once the bus is gone.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Take every event currently buffered without waiting.
    ///
    /// Lagged gaps are logged and skipped.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, lagged_by = n, "TopicReceiver lagged");
                }
                Err(_) => break,
            }
        }
        events
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}
