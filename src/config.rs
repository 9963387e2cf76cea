use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    pub mqtt: MqttConfig,
    pub database: DatabaseConfig,
    pub influxdb: InfluxConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the vendor portal, e.g. "https://www.remocon-net.remotethermo.com/"
    pub url: String,
    pub username: String,
    pub password: String,
    /// Seconds between poll cycles.
    pub periodicity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "sensor/hvac/1".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// The relational sink is opt-in; the other sinks always run.
    #[serde(default)]
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
    #[serde(default = "default_db_table")]
    pub table: String,
}

fn default_db_table() -> String {
    "hvac".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
    /// Written as the `location` tag on every point.
    pub location: String,
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let raw = fs::read_to_string(path)?;
        let expanded = expand_env_placeholders(&raw)?;
        let cfg: Self = serde_yaml::from_str(&expanded)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(!self.portal.url.is_empty(), "portal.url must not be empty");
        anyhow::ensure!(
            !self.portal.username.is_empty(),
            "portal.username must not be empty"
        );
        anyhow::ensure!(
            self.portal.periodicity > 0,
            "portal.periodicity must be a positive number of seconds"
        );
        anyhow::ensure!(!self.mqtt.host.is_empty(), "mqtt.host must not be empty");
        anyhow::ensure!(!self.mqtt.topic.is_empty(), "mqtt.topic must not be empty");
        anyhow::ensure!(!self.influxdb.url.is_empty(), "influxdb.url must not be empty");
        anyhow::ensure!(!self.influxdb.org.is_empty(), "influxdb.org must not be empty");
        anyhow::ensure!(
            !self.influxdb.bucket.is_empty(),
            "influxdb.bucket must not be empty"
        );
        if self.database.enabled {
            anyhow::ensure!(
                !self.database.host.is_empty(),
                "database.host must not be empty"
            );
            anyhow::ensure!(
                !self.database.dbname.is_empty(),
                "database.dbname must not be empty"
            );
        }
        Ok(())
    }
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
/// Notes:
/// - A '$' not followed by '(' or '{' is kept as-is (passwords may contain one).
/// - "$$" becomes a literal "$" (escape).
fn expand_env_placeholders(input: &str) -> Result<String, anyhow::Error> {
    use anyhow::Context;

    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c == '$' {
            match it.peek().copied() {
                Some('$') => {
                    // Escape "$$" -> "$"
                    it.next();
                    out.push('$');
                }
                Some('(') => {
                    // $(VAR)
                    it.next(); // consume '('
                    let var = read_until(&mut it, ')')
                        .context("unterminated env placeholder: missing ')'")?;
                    let val = std::env::var(&var)
                        .with_context(|| format!("missing environment variable: {}", var))?;
                    out.push_str(&val);
                }
                Some('{') => {
                    // ${VAR}
                    it.next(); // consume '{'
                    let var = read_until(&mut it, '}')
                        .context("unterminated env placeholder: missing '}'")?;
                    let val = std::env::var(&var)
                        .with_context(|| format!("missing environment variable: {}", var))?;
                    out.push_str(&val);
                }
                _ => {
                    // Not a placeholder; keep the '$' as-is
                    out.push('$');
                }
            }
        } else {
            out.push(c);
        }
    }

    Ok(out)
}

/// Read characters until we hit `end`, returning the collected string.
/// Consumes the closing delimiter.
fn read_until<I>(it: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut buf = String::new();
    for ch in it.by_ref() {
        if ch == end {
            return Some(buf);
        }
        buf.push(ch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
portal:
  url: "https://portal.example.com/"
  username: "user@example.com"
  password: "secret"
  periodicity: 300

mqtt:
  host: "localhost"
  username: "mqtt-user"
  password: "mqtt-pass"

database:
  host: "localhost"
  port: 5432
  username: "hvac"
  password: "hvac"
  dbname: "hvac"

influxdb:
  url: "http://localhost:8086"
  token: "test-token"
  org: "home"
  bucket: "hvac"
  measurement: "hvac"
  location: "basement"
"#;

    fn write_temp_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "remocon-poller-config-{}-{}.yaml",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_applies_defaults() {
        let path = write_temp_config(BASE);
        let cfg = Config::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(cfg.portal.periodicity, 300);
        assert_eq!(cfg.mqtt.port, 1883);
        assert_eq!(cfg.mqtt.topic, "sensor/hvac/1");
        assert!(!cfg.database.enabled);
        assert_eq!(cfg.database.table, "hvac");
        assert_eq!(cfg.influxdb.location, "basement");
    }

    #[test]
    fn non_numeric_periodicity_is_rejected() {
        let broken = BASE.replace("periodicity: 300", "periodicity: abc");
        let path = write_temp_config(&broken);
        let res = Config::load(&path);
        fs::remove_file(&path).ok();

        assert!(res.is_err());
    }

    #[test]
    fn zero_periodicity_is_rejected() {
        let broken = BASE.replace("periodicity: 300", "periodicity: 0");
        let path = write_temp_config(&broken);
        let res = Config::load(&path);
        fs::remove_file(&path).ok();

        let err = res.unwrap_err().to_string();
        assert!(err.contains("periodicity"), "unexpected error: {err}");
    }

    #[test]
    fn missing_section_is_rejected() {
        let broken = BASE.replace("influxdb:", "timeseries:");
        let path = write_temp_config(&broken);
        let res = Config::load(&path);
        fs::remove_file(&path).ok();

        assert!(res.is_err());
    }

    #[test]
    fn empty_mqtt_host_is_rejected() {
        let broken = BASE.replace(r#"host: "localhost""#, r#"host: """#);
        let path = write_temp_config(&broken);
        let res = Config::load(&path);
        fs::remove_file(&path).ok();

        assert!(res.is_err());
    }

    #[test]
    fn dollar_escape_becomes_literal_dollar() {
        let escaped = BASE.replace(r#"password: "secret""#, r#"password: "pa$$word""#);
        let path = write_temp_config(&escaped);
        let cfg = Config::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(cfg.portal.password, "pa$word");
    }
}
