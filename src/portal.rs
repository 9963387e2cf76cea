//! Vendor portal access. The portal has no public API; readings come from
//! the same endpoints the browser dashboard uses, behind a form login.

use crate::config::PortalConfig;
use crate::error::{AuthError, FetchError};
use crate::reading::{HeatPumpState, Reading};
use regex::Regex;
use reqwest::header;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
/// The dashboard sends this cookie alongside the login form.
const BROWSER_UTC_OFFSET_COOKIE: &str = "browserUtcOffset=-120";

/// An authenticated portal session. Built fresh for every poll cycle; the
/// portal invalidates sessions unpredictably, so nothing is reused.
#[derive(Debug)]
pub struct PortalSession {
    http: reqwest::Client,
    base_url: String,
    gateway_id: String,
}

impl PortalSession {
    /// Log in with the dashboard form and pull the gateway id out of the
    /// returned page.
    pub async fn login(cfg: &PortalConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(HTTP_TIMEOUT)
            .build()?;

        let base_url = cfg.url.trim_end_matches('/').to_string();
        let response = http
            .post(format!("{}/R2/Account/Login", base_url))
            .query(&[("returnUrl", "/R2/Home")])
            .header(header::COOKIE, BROWSER_UTC_OFFSET_COOKIE)
            .form(&[
                ("Email", cfg.username.as_str()),
                ("Password", cfg.password.as_str()),
                ("RememberMe", "false"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status(status));
        }

        let body = response.text().await?;
        let gateway_id = extract_gateway_id(&body).ok_or(AuthError::GatewayIdNotFound)?;
        debug!(gateway_id = %gateway_id, "portal login succeeded");

        Ok(Self {
            http,
            base_url,
            gateway_id,
        })
    }

    pub fn gateway_id(&self) -> &str {
        &self.gateway_id
    }

    /// Fetch the current plant data and reduce it to a `Reading`,
    /// timestamped with the fetch time.
    pub async fn fetch_reading(&self) -> Result<Reading, FetchError> {
        let url = format!(
            "{}/R2/PlantHomeBsb/GetData/{}",
            self.base_url, self.gateway_id
        );
        let response = self
            .http
            .post(url)
            .json(&data_request_body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        reading_from_response(&value)
    }
}

/// The dashboard's own GetData request body; the portal expects the
/// string-typed values verbatim.
fn data_request_body() -> Value {
    serde_json::json!({
        "useCache": "true",
        "zone": "1",
        "filter": {
            "progIds": "null",
            "plant": "true",
            "zone": "true"
        }
    })
}

/// The login response embeds the gateway id in inline JS as
/// `gatewayId: '<token>'`.
fn extract_gateway_id(body: &str) -> Option<String> {
    let re = Regex::new(r"gatewayId: '([^']*)'").unwrap();
    re.captures(body).map(|c| c[1].to_string())
}

fn reading_from_response(value: &Value) -> Result<Reading, FetchError> {
    let plant = value
        .get("data")
        .ok_or(FetchError::MissingField("data"))?
        .get("plantData")
        .ok_or(FetchError::MissingField("plantData"))?;

    let water_temp = number_field(plant, "dhwStorageTemp")?;
    let outside_temp = number_field(plant, "outsideTemp")?;
    let state = match plant.get("heatPumpOn") {
        Some(v) if is_truthy(v) => HeatPumpState::On,
        Some(_) => HeatPumpState::Off,
        None => return Err(FetchError::MissingField("heatPumpOn")),
    };

    Ok(Reading::now(outside_temp, water_temp, state))
}

fn number_field(plant: &Value, key: &'static str) -> Result<f64, FetchError> {
    plant
        .get(key)
        .and_then(Value::as_f64)
        .ok_or(FetchError::MissingField(key))
}

/// Truthiness as the dashboard scripts treat the flag: any non-empty,
/// non-zero value counts as running.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
