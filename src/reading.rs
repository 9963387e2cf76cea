use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compressor state as reported by the portal, reduced to the two wire
/// strings every sink uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatPumpState {
    On,
    Off,
}

impl HeatPumpState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatPumpState::On => "on",
            HeatPumpState::Off => "off",
        }
    }
}

impl fmt::Display for HeatPumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One telemetry observation, captured at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Local capture time, truncated to whole seconds so the MQTT `ts`
    /// string and the relational `ts`/`ts_epoch` columns agree.
    pub ts: DateTime<Local>,
    pub water_temp: f64,
    pub outside_temp: f64,
    pub state: HeatPumpState,
}

impl Reading {
    pub fn now(outside_temp: f64, water_temp: f64, state: HeatPumpState) -> Self {
        let ts = Local::now();
        let ts = ts.with_nanosecond(0).unwrap_or(ts);
        Self {
            ts,
            water_temp,
            outside_temp,
            state,
        }
    }

    pub fn ts_string(&self) -> String {
        self.ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn ts_epoch(&self) -> i64 {
        self.ts.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn state_wire_strings() {
        assert_eq!(HeatPumpState::On.as_str(), "on");
        assert_eq!(HeatPumpState::Off.as_str(), "off");
        assert_eq!(HeatPumpState::On.to_string(), "on");
    }

    #[test]
    fn timestamp_renderings_agree() {
        let ts = Local.with_ymd_and_hms(2024, 7, 23, 6, 30, 5).unwrap();
        let reading = Reading {
            ts,
            water_temp: 45.2,
            outside_temp: 3.1,
            state: HeatPumpState::On,
        };
        assert_eq!(reading.ts_string(), "2024-07-23 06:30:05");
        assert_eq!(reading.ts_epoch(), ts.timestamp());
    }

    #[test]
    fn now_truncates_to_whole_seconds() {
        let reading = Reading::now(3.1, 45.2, HeatPumpState::Off);
        assert_eq!(reading.ts.nanosecond(), 0);
    }
}
