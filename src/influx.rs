use crate::config::InfluxConfig;
use crate::error::DeliveryError;
use crate::reading::Reading;
use crate::sink::Sink;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// InfluxDB v2 sink. Points are rendered as line protocol locally and sent
/// over the plain HTTP write endpoint.
pub struct InfluxSink {
    http: reqwest::Client,
    cfg: InfluxConfig,
}

impl InfluxSink {
    pub fn new(cfg: InfluxConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { http, cfg })
    }
}

#[async_trait]
impl Sink for InfluxSink {
    fn name(&self) -> &'static str {
        "influxdb"
    }

    async fn publish(&self, reading: &Reading) -> Result<(), DeliveryError> {
        // Points carry the write time, not the reading's fetch time.
        let line = line_protocol(
            &self.cfg.measurement,
            &self.cfg.location,
            reading,
            Utc::now().timestamp(),
        );
        let url = format!("{}/api/v2/write", self.cfg.url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .query(&[
                ("org", self.cfg.org.as_str()),
                ("bucket", self.cfg.bucket.as_str()),
                ("precision", "s"),
            ])
            .header("Authorization", format!("Token {}", self.cfg.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Influx(format!("HTTP {}", status)));
        }
        Ok(())
    }
}

/// Render one reading as a line protocol point with a second-precision
/// timestamp. Unsuffixed numbers are floats to InfluxDB, so whole-number
/// temperatures need no special casing.
pub fn line_protocol(measurement: &str, location: &str, reading: &Reading, ts_secs: i64) -> String {
    format!(
        "{},location={} temp_outside={},temp_water={},heatpump_state=\"{}\" {}",
        escape_measurement(measurement),
        escape_tag_value(location),
        reading.outside_temp,
        reading.water_temp,
        escape_string_field(reading.state.as_str()),
        ts_secs
    )
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag_value(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

fn escape_string_field(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
