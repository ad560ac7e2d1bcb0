//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables,
//! including discovery of the Redis service the item store persists to.

use std::env;

use serde::Deserialize;
use tracing::warn;

/// Redis URLs tried in order when neither `REDIS_URL` nor `VCAP_SERVICES` is set.
pub const DEFAULT_REDIS_CANDIDATES: [&str; 2] = ["redis://127.0.0.1:6379", "redis://redis:6379"];

/// Which key-value backend the item store runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Redis, discovered from `redis_urls`
    #[default]
    Redis,
    /// Process memory; items are lost on restart
    Memory,
}

impl StoreBackend {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "redis" => Some(StoreBackend::Redis),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    pub store_backend: StoreBackend,
    /// Redis URLs to try, in order, until one answers PING
    pub redis_urls: Vec<String>,
    /// MQTT relay settings
    pub mqtt: MqttConfig,
}

/// Settings for the MQTT side of the realtime relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    /// Broker host; `None` runs the relay in loopback mode
    pub broker_host: Option<String>,
    pub broker_port: u16,
    /// Keep-alive interval in seconds
    pub keep_alive: u64,
    /// Topic change notices are published on and relayed from
    pub topic: String,
    pub client_id: String,
    /// Broker login; only sent when a username is set
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls_enabled: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: None,
            broker_port: 1883,
            keep_alive: 5,
            topic: "channel01".to_string(),
            client_id: "item-store".to_string(),
            username: None,
            password: None,
            tls_enabled: false,
        }
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 5000)
    /// - `STORE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_URL` - Explicit Redis URL, skips discovery
    /// - `VCAP_SERVICES` - Cloud Foundry bindings; `rediscloud` credentials are used
    /// - `MQTT_BROKER_URL` - Broker host (default: unset, loopback relay)
    /// - `MQTT_BROKER_PORT` - Broker port (default: 1883)
    /// - `MQTT_KEEPALIVE` - Keep-alive in seconds (default: 5)
    /// - `MQTT_TOPIC` - Relay topic (default: channel01)
    /// - `MQTT_CLIENT_ID` - Client id (default: item-store)
    /// - `MQTT_USERNAME` / `MQTT_PASSWORD` - Broker credentials (default: unset)
    /// - `MQTT_TLS_ENABLED` - Connect over TLS (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from any variable source, e.g. a map in tests.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = MqttConfig::default();

        let store_backend = match var("STORE_BACKEND") {
            Some(name) => StoreBackend::from_name(&name).unwrap_or_else(|| {
                warn!("Unknown STORE_BACKEND '{}', using redis", name);
                StoreBackend::Redis
            }),
            None => StoreBackend::Redis,
        };

        Self {
            server_port: var("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            store_backend,
            redis_urls: redis_urls_from(&var),
            mqtt: MqttConfig {
                broker_host: var("MQTT_BROKER_URL"),
                broker_port: var("MQTT_BROKER_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.broker_port),
                keep_alive: var("MQTT_KEEPALIVE")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.keep_alive),
                topic: var("MQTT_TOPIC").unwrap_or(defaults.topic),
                client_id: var("MQTT_CLIENT_ID").unwrap_or(defaults.client_id),
                username: var("MQTT_USERNAME"),
                password: var("MQTT_PASSWORD"),
                tls_enabled: var("MQTT_TLS_ENABLED")
                    .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
                    .unwrap_or(defaults.tls_enabled),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 5000,
            store_backend: StoreBackend::Redis,
            redis_urls: default_redis_urls(),
            mqtt: MqttConfig::default(),
        }
    }
}

fn default_redis_urls() -> Vec<String> {
    DEFAULT_REDIS_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

/// `REDIS_URL`, then `VCAP_SERVICES`, then the default candidates.
fn redis_urls_from(var: &impl Fn(&str) -> Option<String>) -> Vec<String> {
    if let Some(url) = var("REDIS_URL") {
        return vec![url];
    }

    if let Some(vcap) = var("VCAP_SERVICES") {
        match redis_url_from_vcap(&vcap) {
            Some(url) => return vec![url],
            None => warn!("VCAP_SERVICES is set but has no usable rediscloud credentials"),
        }
    }

    default_redis_urls()
}

// == VCAP_SERVICES ==
#[derive(Debug, Deserialize)]
struct VcapServices {
    rediscloud: Vec<VcapBinding>,
}

#[derive(Debug, Deserialize)]
struct VcapBinding {
    credentials: RedisCredentials,
}

#[derive(Debug, Deserialize)]
struct RedisCredentials {
    hostname: String,
    port: PortValue,
    #[serde(default)]
    password: Option<String>,
}

/// Cloud Foundry sends the port as either a number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

/// Builds a Redis URL from a Cloud Foundry `VCAP_SERVICES` document.
///
/// Returns `None` when the document is malformed or has no `rediscloud` binding.
pub fn redis_url_from_vcap(vcap: &str) -> Option<String> {
    let services: VcapServices = serde_json::from_str(vcap).ok()?;
    let creds = services.rediscloud.into_iter().next()?.credentials;

    let port: u16 = match creds.port {
        PortValue::Number(p) => p,
        PortValue::Text(s) => s.parse().ok()?,
    };

    let url = match creds.password.filter(|p| !p.is_empty()) {
        Some(password) => format!("redis://:{}@{}:{}", password, creds.hostname, port),
        None => format!("redis://{}:{}", creds.hostname, port),
    };
    Some(url)
}
