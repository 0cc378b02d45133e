//! MQTT-backed bus session.
//!
//! Wraps a rumqttc client plus a connection-driver thread. Channel ids are
//! routed into topics as `<session>/<channel>`; payloads travel as JSON
//! envelopes with a send timestamp.

use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::messages::BusPayload;
use super::PublishSink;
use crate::config::BusConfig;

/// How long `open` waits for the broker to acknowledge the connection.
const CONNECT_WAIT: Duration = Duration::from_secs(2);

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Bus errors
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Failed to start bus session: {0}")]
    SessionError(String),
}

/// Wire envelope around every published payload.
#[derive(Debug, Clone, Copy, Serialize)]
struct Envelope {
    stamp: NaiveDateTime,
    #[serde(flatten)]
    payload: BusPayload,
}

pub struct BusSession {
    client: Client,
    conn_state: watch::Receiver<ConnectionState>,
    session: String,
}

impl BusSession {
    /// Connect to the broker and spawn the connection-driver thread.
    ///
    /// Waits briefly for the broker's acknowledgment so `is_running`
    /// reflects reality right after the call; a session that never comes
    /// up is reported by `is_running`, not as an error here.
    pub fn open(config: &BusConfig) -> Result<Self, BusError> {
        let mut mqtt_options = MqttOptions::new("padbridge", &config.host, config.port);
        mqtt_options.set_keep_alive(Duration::from_secs(5));

        let (client, mut connection) = Client::new(mqtt_options, 100);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        thread::Builder::new()
            .name("bus-session".to_string())
            .spawn(move || {
                for notification in connection.iter() {
                    match notification {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            info!("Bus session established");
                            let _ = state_tx.send(ConnectionState::Connected);
                        }
                        Ok(Event::Incoming(Packet::Disconnect)) => {
                            warn!("Bus session disconnected by broker");
                            let _ = state_tx.send(ConnectionState::Disconnected);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!("Bus session error: {}", e);
                            let _ = state_tx.send(ConnectionState::Failed);
                            break;
                        }
                    }
                }
                debug!("Bus session driver finished");
            })
            .map_err(|e| BusError::SessionError(e.to_string()))?;

        let deadline = Instant::now() + CONNECT_WAIT;
        while *state_rx.borrow() == ConnectionState::Connecting && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }

        Ok(Self {
            client,
            conn_state: state_rx,
            session: config.session.clone(),
        })
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.conn_state.borrow().clone()
    }
}

impl PublishSink for BusSession {
    fn is_running(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    fn send(&self, channel: u32, stamp: NaiveDateTime, payload: BusPayload) {
        let topic = format!("{}/{}", self.session, channel);
        let envelope = Envelope { stamp, payload };

        match serde_json::to_vec(&envelope) {
            Ok(bytes) => {
                if let Err(e) = self.client.try_publish(topic, QoS::AtMostOnce, false, bytes) {
                    warn!("Failed to publish on channel {}: {}", channel, e);
                }
            }
            Err(e) => warn!("Failed to encode payload for channel {}: {}", channel, e),
        }
    }
}
