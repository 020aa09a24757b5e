//! Fire-and-forget update notifications.
//!
//! The sync pipeline signals "topic X changed" after persisting data; what
//! transports those signals to a UI is not this crate's concern. Publish
//! failures are logged and swallowed, never propagated into sync results.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Well-known topics the sync pipeline publishes to.
pub mod topics {
    pub const SENSORS: &str = "environmental_sensors";
    pub const READINGS: &str = "environmental_readings";
    pub const ALERTS: &str = "environmental_alerts";
    pub const DASHBOARD: &str = "environmental_dashboard";
    pub const LOCATION_UPDATES: &str = "location_updates";

    /// Per-chart topics emitted after each location's weather sync.
    pub const CHARTS: &[&str] = &[
        "temperature_chart",
        "humidity_chart",
        "hourly_forecast",
        "historical_chart",
        "marine_weather",
        "air_quality",
        "flood_risk",
    ];
}

/// A single published update.
#[derive(Debug, Clone)]
pub struct Notification {
    pub topic: String,
    pub payload: Value,
}

/// Sink for "topic updated" signals.
pub trait Notifier: Send + Sync {
    fn publish(&self, topic: &str, payload: Value);
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier backed by a tokio broadcast channel.
///
/// Consumers (a websocket bridge, a test harness) subscribe for receivers;
/// with no subscribers the send result is an error by design and simply
/// discarded.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, topic: &str, payload: Value) {
        tracing::debug!(topic, "Publishing update");
        let _ = self.sender.send(Notification {
            topic: topic.to_string(),
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.publish("location_updates", serde_json::json!({"location_id": "abc"}));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.topic, "location_updates");
        assert_eq!(received.payload["location_id"], "abc");
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let notifier = BroadcastNotifier::new(8);
        notifier.publish("environmental_alerts", Value::Null);
    }
}
