use thiserror::Error;

/// Errors from the portal login flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login rejected: HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("gateway id not found in login response")]
    GatewayIdNotFound,
}

/// Errors from the telemetry data request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("data request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("data request rejected: HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid JSON in data response: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing field in data response: {0}")]
    MissingField(&'static str),
}

/// Errors from delivering a reading to a sink. Absorbed per sink,
/// never escalated past the cycle.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("MQTT broker unreachable: {0}")]
    BrokerUnreachable(String),
    #[error("MQTT error: {0}")]
    Mqtt(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("InfluxDB write rejected: {0}")]
    Influx(String),
}

/// A failed poll cycle. Logged by the scheduler and retried on the
/// next tick; the process never exits because of one.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("telemetry fetch failed: {0}")]
    Fetch(#[from] FetchError),
}
