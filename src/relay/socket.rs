//! Socket Channel
//!
//! WebSocket endpoint streaming relay messages to browser clients.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::relay::{RelayHub, RelayMessage};

/// Frame sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    MqttMessage(RelayMessage),
}

/// Frame received from clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientFrame {
    Publish { data: PublishData },
    Subscribe {},
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishData {
    #[serde(default)]
    pub message: String,
}

/// Handler for GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

async fn handle_socket(mut socket: WebSocket, hub: RelayHub) {
    let mut inbound = hub.listen();
    info!("Socket client connected");

    loop {
        tokio::select! {
            received = socket.recv() => match received {
                Some(Ok(Message::Text(text))) => handle_client_frame(&hub, &text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Socket receive error: {}", e);
                    break;
                }
            },
            message = inbound.recv() => match message {
                Ok(message) => {
                    let frame = match serde_json::to_string(&ServerFrame::MqttMessage(message)) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Could not encode relay message: {}", e);
                            continue;
                        }
                    };
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Socket client lagged, {} relay messages skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    info!("Socket client disconnected");
}

fn handle_client_frame(hub: &RelayHub, text: &str) {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Publish { data }) => hub.notify(data.message),
        Ok(ClientFrame::Subscribe {}) => hub.subscribe(hub.topic().to_string()),
        Err(e) => debug!("Ignoring malformed socket frame: {}", e),
    }
}
