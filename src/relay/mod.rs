//! Realtime Relay Module
//!
//! Bridges MQTT broker messages to socket clients.
//!
//! # Parts
//! - Hub: broadcast fan-out to clients and command channel to the bridge
//! - MQTT bridge: background task talking to the broker
//! - Socket: `GET /ws` endpoint

mod hub;
mod mqtt;
pub mod socket;

pub use hub::{
    RelayCommand, RelayHub, RelayMessage, CLIENT_CHANNEL_CAPACITY, COMMAND_CHANNEL_CAPACITY,
};
pub use mqtt::spawn_mqtt_bridge;
pub use socket::ws_handler;
