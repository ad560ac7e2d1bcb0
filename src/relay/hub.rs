//! Relay Hub
//!
//! Fans broker messages out to socket clients and forwards publish/subscribe
//! requests to the MQTT bridge.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Capacity of the fan-out channel to socket clients.
pub const CLIENT_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the command channel to the MQTT bridge.
pub const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// A message on a broker topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub topic: String,
    pub payload: String,
}

impl RelayMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Request for the MQTT bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayCommand {
    Publish(RelayMessage),
    Subscribe(String),
}

// == Relay Hub ==
/// Shared handle to the realtime relay.
///
/// Without a bridge the hub runs in loopback mode: published messages go
/// straight to connected socket clients. Nothing is buffered or retried.
#[derive(Debug, Clone)]
pub struct RelayHub {
    clients: broadcast::Sender<RelayMessage>,
    commands: Option<mpsc::Sender<RelayCommand>>,
    topic: String,
}

impl RelayHub {
    /// Creates a hub with no broker behind it.
    pub fn loopback(topic: impl Into<String>) -> Self {
        let (clients, _) = broadcast::channel(CLIENT_CHANNEL_CAPACITY);
        Self {
            clients,
            commands: None,
            topic: topic.into(),
        }
    }

    /// Creates a hub whose publish/subscribe requests are read from the returned receiver.
    pub fn bridged(topic: impl Into<String>) -> (Self, mpsc::Receiver<RelayCommand>) {
        let (clients, _) = broadcast::channel(CLIENT_CHANNEL_CAPACITY);
        let (commands, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let hub = Self {
            clients,
            commands: Some(commands),
            topic: topic.into(),
        };
        (hub, rx)
    }

    /// The configured relay topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_bridged(&self) -> bool {
        self.commands.is_some()
    }

    /// Registers a socket client for inbound messages.
    pub fn listen(&self) -> broadcast::Receiver<RelayMessage> {
        self.clients.subscribe()
    }

    /// Hands an inbound message to every connected client.
    ///
    /// Returns the number of clients reached.
    pub fn deliver(&self, message: RelayMessage) -> usize {
        match self.clients.send(message) {
            Ok(count) => count,
            Err(_) => {
                debug!("No socket clients connected, message dropped");
                0
            }
        }
    }

    /// Publishes `payload` on `topic`.
    pub fn publish(&self, topic: impl Into<String>, payload: impl Into<String>) {
        let message = RelayMessage::new(topic, payload);
        match &self.commands {
            Some(commands) => self.send_command(commands, RelayCommand::Publish(message)),
            None => {
                self.deliver(message);
            }
        }
    }

    /// Publishes `payload` on the configured topic.
    pub fn notify(&self, payload: impl Into<String>) {
        self.publish(self.topic.clone(), payload);
    }

    /// Asks the bridge to subscribe to `topic`; no-op in loopback mode.
    pub fn subscribe(&self, topic: impl Into<String>) {
        if let Some(commands) = &self.commands {
            self.send_command(commands, RelayCommand::Subscribe(topic.into()));
        }
    }

    fn send_command(&self, commands: &mpsc::Sender<RelayCommand>, command: RelayCommand) {
        if let Err(e) = commands.try_send(command) {
            warn!("Relay command dropped: {}", e);
        }
    }
}
