// Subscription Gateway
// In-process publish/subscribe bus. Delivery is at-most-once with no replay:
// a subscriber only sees messages published after it subscribed.

use crate::models::{AlertsPage, ConnectedUsers, StreamTick};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    MetricsByTab,
    ConnectedUsers,
    Alerts,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::MetricsByTab, Topic::ConnectedUsers, Topic::Alerts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::MetricsByTab => "metricsByTab",
            Topic::ConnectedUsers => "connectedUsers",
            Topic::Alerts => "alerts",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| format!("unknown topic '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TopicMessage {
    MetricsTick(StreamTick),
    ConnectedUsers(ConnectedUsers),
    Alerts(AlertsPage),
}

pub struct SubscriptionGateway {
    metrics_by_tab: broadcast::Sender<TopicMessage>,
    connected_users: broadcast::Sender<TopicMessage>,
    alerts: broadcast::Sender<TopicMessage>,
}

impl SubscriptionGateway {
    /// `capacity` bounds how far a slow subscriber may fall behind before it drops messages
    pub fn new(capacity: usize) -> Self {
        Self {
            metrics_by_tab: broadcast::channel(capacity).0,
            connected_users: broadcast::channel(capacity).0,
            alerts: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<TopicMessage> {
        match topic {
            Topic::MetricsByTab => &self.metrics_by_tab,
            Topic::ConnectedUsers => &self.connected_users,
            Topic::Alerts => &self.alerts,
        }
    }

    /// Fan `message` out to current subscribers. Returns how many were reached.
    pub fn publish(&self, topic: Topic, message: TopicMessage) -> usize {
        match self.sender(topic).send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!(topic = %topic, "Published with no subscribers");
                0
            },
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }

    /// Infinite stream of messages published to `topic` from now on.
    /// Dropping the stream unsubscribes.
    pub fn subscribe(&self, topic: Topic) -> impl Stream<Item = TopicMessage> + Send + 'static {
        BroadcastStream::new(self.sender(topic).subscribe()).filter_map(move |res| match res {
            Ok(message) => Some(message),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(topic = %topic, skipped, "Subscriber lagged, messages dropped");
                None
            },
        })
    }

    pub fn subscribe_ticks(&self) -> impl Stream<Item = StreamTick> + Send + 'static {
        self.subscribe(Topic::MetricsByTab).filter_map(|message| match message {
            TopicMessage::MetricsTick(tick) => Some(tick),
            _ => None,
        })
    }
}
