//! Pub/Sub support for Redis
//!
//! A [`Subscriber`] owns one pooled connection for as long as it lives.
//! Once a connection has entered subscribe mode it can only issue
//! (P)SUBSCRIBE, (P)UNSUBSCRIBE and PING, so it is never handed back to the
//! idle set.
//!
//! ```no_run
//! use redis_keeper::{Client, Configuration};
//!
//! # async fn example() -> redis_keeper::RedisResult<()> {
//! let client = Client::new(Configuration::new("localhost", 6379));
//!
//! let mut subscriber = client.subscriber().await?;
//! subscriber.subscribe(&["news", "updates"]).await?;
//!
//! loop {
//!     let message = subscriber.next_message().await?;
//!     println!("Received: {} on channel {}", message.payload, message.channel);
//! }
//! # }
//! ```

use crate::pool::PooledConnection;
use redis_keeper_core::{
    error::{RedisError, RedisResult},
    types::RedisValue,
    value::{ReplyView, RespValue},
};
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;
use tracing::debug;

/// A message received from a Redis channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubMessage {
    /// The channel the message was received on
    pub channel: String,
    /// The message payload
    pub payload: String,
    /// The pattern that matched (for pattern subscriptions)
    pub pattern: Option<String>,
}

/// Frames a connection in subscribe mode can receive
#[derive(Debug)]
enum PushFrame {
    Message(PubSubMessage),
    Confirmation { kind: ConfirmationKind, name: Option<String> },
    Pong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmationKind {
    Subscribe,
    Unsubscribe,
    PSubscribe,
    PUnsubscribe,
}

impl ConfirmationKind {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "subscribe" => Some(Self::Subscribe),
            "unsubscribe" => Some(Self::Unsubscribe),
            "psubscribe" => Some(Self::PSubscribe),
            "punsubscribe" => Some(Self::PUnsubscribe),
            _ => None,
        }
    }
}

fn parse_push(response: RespValue) -> RedisResult<PushFrame> {
    let items = ReplyView::new(response).as_array()?;
    let kind = items
        .first()
        .ok_or_else(|| RedisError::Protocol("Empty pub/sub frame".to_string()))?
        .as_string()?;

    match (kind.as_str(), items.len()) {
        ("message", 3) => Ok(PushFrame::Message(PubSubMessage {
            channel: items[1].as_string()?,
            payload: items[2].as_string()?,
            pattern: None,
        })),
        ("pmessage", 4) => Ok(PushFrame::Message(PubSubMessage {
            pattern: Some(items[1].as_string()?),
            channel: items[2].as_string()?,
            payload: items[3].as_string()?,
        })),
        ("pong", _) => Ok(PushFrame::Pong),
        (other, 3) => match ConfirmationKind::from_str(other) {
            Some(kind) => Ok(PushFrame::Confirmation {
                kind,
                name: items[1].as_opt_string()?,
            }),
            None => Err(RedisError::Protocol(format!(
                "Unknown pub/sub message type: {}",
                other
            ))),
        },
        (other, len) => Err(RedisError::Protocol(format!(
            "Invalid pub/sub frame '{}' with {} elements",
            other, len
        ))),
    }
}

/// Parse a Pub/Sub frame.
///
/// Returns `None` for subscription confirmations and PONGs, which carry no
/// payload for the application.
pub fn parse_pubsub_message(response: RespValue) -> RedisResult<Option<PubSubMessage>> {
    match parse_push(response)? {
        PushFrame::Message(message) => Ok(Some(message)),
        PushFrame::Confirmation { .. } | PushFrame::Pong => Ok(None),
    }
}

/// Redis Pub/Sub subscriber
#[derive(Debug)]
pub struct Subscriber {
    conn: PooledConnection,
    channels: BTreeSet<String>,
    patterns: BTreeSet<String>,
    backlog: VecDeque<PubSubMessage>,
}

impl Subscriber {
    pub(crate) fn new(mut conn: PooledConnection) -> Self {
        conn.poison();
        Self {
            conn,
            channels: BTreeSet::new(),
            patterns: BTreeSet::new(),
            backlog: VecDeque::new(),
        }
    }

    /// Subscribe to channels
    pub async fn subscribe(&mut self, channels: &[&str]) -> RedisResult<()> {
        if channels.is_empty() {
            return Ok(());
        }
        self.request("SUBSCRIBE", channels, ConfirmationKind::Subscribe, channels.len())
            .await
    }

    /// Subscribe to channel patterns
    pub async fn psubscribe(&mut self, patterns: &[&str]) -> RedisResult<()> {
        if patterns.is_empty() {
            return Ok(());
        }
        self.request("PSUBSCRIBE", patterns, ConfirmationKind::PSubscribe, patterns.len())
            .await
    }

    /// Unsubscribe from channels; an empty list unsubscribes from all of them
    pub async fn unsubscribe(&mut self, channels: &[&str]) -> RedisResult<()> {
        let expected = if channels.is_empty() {
            self.channels.len().max(1)
        } else {
            channels.len()
        };
        self.request("UNSUBSCRIBE", channels, ConfirmationKind::Unsubscribe, expected)
            .await
    }

    /// Unsubscribe from patterns; an empty list unsubscribes from all of them
    pub async fn punsubscribe(&mut self, patterns: &[&str]) -> RedisResult<()> {
        let expected = if patterns.is_empty() {
            self.patterns.len().max(1)
        } else {
            patterns.len()
        };
        self.request("PUNSUBSCRIBE", patterns, ConfirmationKind::PUnsubscribe, expected)
            .await
    }

    async fn request(
        &mut self,
        command: &str,
        names: &[&str],
        kind: ConfirmationKind,
        expected: usize,
    ) -> RedisResult<()> {
        let args: Vec<RedisValue> = names.iter().copied().map(RedisValue::from).collect();
        self.conn.send(command, &args)?;
        self.conn.flush().await?;

        let mut confirmed = 0;
        while confirmed < expected {
            let frame = parse_push(self.conn.receive().await?)?;
            match frame {
                PushFrame::Message(message) => self.backlog.push_back(message),
                PushFrame::Confirmation { kind: got, name } => {
                    self.track(got, name);
                    if got == kind {
                        confirmed += 1;
                    }
                }
                PushFrame::Pong => {}
            }
        }

        debug!(command, ?names, "Pub/sub subscriptions updated");
        Ok(())
    }

    fn track(&mut self, kind: ConfirmationKind, name: Option<String>) {
        let Some(name) = name else { return };
        match kind {
            ConfirmationKind::Subscribe => {
                self.channels.insert(name);
            }
            ConfirmationKind::Unsubscribe => {
                self.channels.remove(&name);
            }
            ConfirmationKind::PSubscribe => {
                self.patterns.insert(name);
            }
            ConfirmationKind::PUnsubscribe => {
                self.patterns.remove(&name);
            }
        }
    }

    /// Wait for the next message. No read timeout applies.
    pub async fn next_message(&mut self) -> RedisResult<PubSubMessage> {
        if let Some(message) = self.backlog.pop_front() {
            return Ok(message);
        }

        loop {
            let frame = parse_push(self.conn.receive_timeout(None).await?)?;
            match frame {
                PushFrame::Message(message) => return Ok(message),
                PushFrame::Confirmation { kind, name } => self.track(kind, name),
                PushFrame::Pong => {}
            }
        }
    }

    /// Wait up to `wait` for the next message; `None` when nothing arrived
    pub async fn next_message_timeout(
        &mut self,
        wait: Duration,
    ) -> RedisResult<Option<PubSubMessage>> {
        match tokio::time::timeout(wait, self.next_message()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Channels currently subscribed to
    #[must_use]
    pub fn subscribed_channels(&self) -> Vec<String> {
        self.channels.iter().cloned().collect()
    }

    /// Patterns currently subscribed to
    #[must_use]
    pub fn subscribed_patterns(&self) -> Vec<String> {
        self.patterns.iter().cloned().collect()
    }

    /// Check if subscribed to a specific channel
    #[must_use]
    pub fn is_subscribed_to_channel(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    /// Check if subscribed to a specific pattern
    #[must_use]
    pub fn is_subscribed_to_pattern(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }
}
