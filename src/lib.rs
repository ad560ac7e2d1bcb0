//! Item Store - A small CRUD REST service backed by Redis
//!
//! Provides item persistence with linear-scan queries, and a realtime relay
//! forwarding MQTT broker messages to WebSocket clients.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod relay;
pub mod store;

pub use api::AppState;
pub use config::Config;
pub use store::{Item, ItemStore};
