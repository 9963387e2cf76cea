use crate::config::MqttConfig;
use crate::error::DeliveryError;
use crate::reading::Reading;
use crate::sink::Sink;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

// Use the MQTT v5 API surface only
use rumqttc::v5 as mqtt5;
use rumqttc::{Outgoing, Transport};

// Re-export types so the rest of the code can use these names
pub type MqttOptions = mqtt5::MqttOptions;
pub type AsyncClient = mqtt5::AsyncClient;
pub type Incoming = mqtt5::Incoming;

const KEEP_ALIVE: Duration = Duration::from_secs(60);
/// Upper bound for one connect/publish/disconnect exchange.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(15);

/// Wire payload for one reading. Field order and spelling are fixed;
/// downstream consumers match on them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadingPayload<'a> {
    ts: String,
    water_temp: f64,
    outside_temp: f64,
    heat_pump_state: &'a str,
}

/// Render the JSON payload published for a reading.
pub fn encode_payload(reading: &Reading) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ReadingPayload {
        ts: reading.ts_string(),
        water_temp: reading.water_temp,
        outside_temp: reading.outside_temp,
        heat_pump_state: reading.state.as_str(),
    })
}

pub fn build_options(cfg: &MqttConfig) -> MqttOptions {
    let client_id = format!("remocon-poller-{}", Uuid::new_v4());
    // Using v5::MqttOptions selects MQTT 5
    let mut opts = MqttOptions::new(client_id, cfg.host.as_str(), cfg.port);
    opts.set_keep_alive(KEEP_ALIVE);
    opts.set_clean_start(true);
    opts.set_credentials(cfg.username.clone(), cfg.password.clone());
    if cfg.port == 8883 {
        opts.set_transport(Transport::tls_with_default_config());
    }
    opts
}

pub struct MqttSink {
    cfg: MqttConfig,
}

impl MqttSink {
    pub fn new(cfg: MqttConfig) -> Self {
        Self { cfg }
    }

    /// Connect, publish one payload at QoS 1, wait for the broker's ack,
    /// disconnect. The broker sees one short-lived session per reading.
    async fn publish_once(&self, payload: String) -> Result<(), DeliveryError> {
        let (client, mut eventloop) = AsyncClient::new(build_options(&self.cfg), 10);
        client
            .publish(
                self.cfg.topic.clone(),
                mqtt5::mqttbytes::QoS::AtLeastOnce,
                false,
                payload,
            )
            .await
            .map_err(|e| DeliveryError::Mqtt(e.to_string()))?;

        let exchange = async {
            let mut acked = false;
            loop {
                match eventloop.poll().await {
                    Ok(mqtt5::Event::Incoming(Incoming::ConnAck(_))) => {
                        debug!(host = %self.cfg.host, "mqtt connected");
                    }
                    Ok(mqtt5::Event::Incoming(Incoming::PubAck(_))) => {
                        acked = true;
                        client
                            .disconnect()
                            .await
                            .map_err(|e| DeliveryError::Mqtt(e.to_string()))?;
                    }
                    Ok(mqtt5::Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                    Ok(_) => continue,
                    // Some brokers drop the connection after the ack instead
                    // of answering the disconnect.
                    Err(_) if acked => return Ok(()),
                    Err(e) => return Err(DeliveryError::BrokerUnreachable(e.to_string())),
                }
            }
        };

        tokio::time::timeout(PUBLISH_TIMEOUT, exchange)
            .await
            .map_err(|_| DeliveryError::BrokerUnreachable("publish timed out".into()))?
    }
}

#[async_trait]
impl Sink for MqttSink {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    async fn publish(&self, reading: &Reading) -> Result<(), DeliveryError> {
        let payload = encode_payload(reading)?;
        self.publish_once(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::HeatPumpState;
    use chrono::{Local, TimeZone};
    use pretty_assertions::assert_eq;

    #[test]
    fn payload_matches_wire_format_exactly() {
        let reading = Reading {
            ts: Local.with_ymd_and_hms(2024, 7, 23, 6, 30, 0).unwrap(),
            water_temp: 45.2,
            outside_temp: 3.1,
            state: HeatPumpState::On,
        };
        assert_eq!(
            encode_payload(&reading).unwrap(),
            r#"{"ts":"2024-07-23 06:30:00","waterTemp":45.2,"outsideTemp":3.1,"heatPumpState":"on"}"#
        );
    }

    #[test]
    fn off_state_is_spelled_out() {
        let reading = Reading {
            ts: Local.with_ymd_and_hms(2024, 12, 1, 23, 59, 59).unwrap(),
            water_temp: 44.0,
            outside_temp: -1.5,
            state: HeatPumpState::Off,
        };
        assert_eq!(
            encode_payload(&reading).unwrap(),
            r#"{"ts":"2024-12-01 23:59:59","waterTemp":44.0,"outsideTemp":-1.5,"heatPumpState":"off"}"#
        );
    }
}
