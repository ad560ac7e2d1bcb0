//! MQTT Bridge Task
//!
//! Background task connecting the relay hub to an MQTT broker.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, Publish, QoS, Transport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::MqttConfig;
use crate::relay::{RelayCommand, RelayHub, RelayMessage};

/// Pause after a connection error before the event loop reconnects.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the rumqttc request queue.
const REQUEST_CAPACITY: usize = 10;

/// Spawns the bridge between `hub` and the broker named in `config`.
///
/// Inbound publishes are delivered to the hub's socket clients; commands read
/// from `commands` are sent to the broker. The relay topic is (re)subscribed
/// on every successful connect. Returns `None` when no broker is configured.
///
/// The returned handle is aborted during graceful shutdown.
pub fn spawn_mqtt_bridge(
    config: &MqttConfig,
    hub: RelayHub,
    mut commands: mpsc::Receiver<RelayCommand>,
) -> Option<JoinHandle<()>> {
    let host = config.broker_host.clone()?;

    let options = mqtt_options(config, &host);
    let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
    let port = config.broker_port;

    Some(tokio::spawn(async move {
        info!("Starting MQTT bridge to {}:{}", host, port);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => execute(&client, command),
                    None => {
                        info!("Relay command channel closed, stopping MQTT bridge");
                        break;
                    }
                },
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Connected to MQTT broker, subscribing to {}", hub.topic());
                        execute(&client, RelayCommand::Subscribe(hub.topic().to_string()));
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = inbound_message(&publish);
                        debug!("MQTT message on {}", message.topic);
                        hub.deliver(message);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT connection error: {}", e);
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        }
    }))
}

/// Connection options for `host`, with credentials and TLS when configured.
fn mqtt_options(config: &MqttConfig, host: &str) -> MqttOptions {
    let mut options = MqttOptions::new(config.client_id.clone(), host, config.broker_port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive));

    if let Some(username) = &config.username {
        let password = config.password.clone().unwrap_or_default();
        options.set_credentials(username.clone(), password);
    }
    if config.tls_enabled {
        options.set_transport(Transport::tls_with_default_config());
    }
    options
}

fn execute(client: &AsyncClient, command: RelayCommand) {
    let result = match command {
        RelayCommand::Publish(message) => client.try_publish(
            message.topic,
            QoS::AtMostOnce,
            false,
            message.payload.into_bytes(),
        ),
        RelayCommand::Subscribe(topic) => client.try_subscribe(topic, QoS::AtMostOnce),
    };

    if let Err(e) = result {
        warn!("MQTT request dropped: {}", e);
    }
}

/// Converts a broker publish into a relay message, replacing invalid UTF-8.
fn inbound_message(publish: &Publish) -> RelayMessage {
    RelayMessage::new(
        publish.topic.clone(),
        String::from_utf8_lossy(&publish.payload).into_owned(),
    )
}
