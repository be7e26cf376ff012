//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::Invalid("LOG_FORMAT")),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Allowed client origins for CORS, comma separated, or `*`
    pub client_origin: String,
    /// Max inbound WebSocket messages per second per connection
    pub input_rate_limit: u32,
    /// Capacity of each match's command channel
    pub match_command_buffer: usize,
    /// Largest WebSocket message accepted from a client, in bytes
    pub max_message_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            log_format: lookup("LOG_FORMAT")
                .map(|v| v.parse::<LogFormat>())
                .transpose()?
                .unwrap_or(LogFormat::Pretty),

            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),

            input_rate_limit: parse_or(&lookup, "INPUT_RATE_LIMIT", 20)?,

            match_command_buffer: parse_or(&lookup, "MATCH_COMMAND_BUFFER", 64)?,

            max_message_bytes: parse_or(&lookup, "MAX_MESSAGE_BYTES", 16 * 1024)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.client_origin, "*");
        assert_eq!(config.input_rate_limit, 20);
        assert_eq!(config.match_command_buffer, 64);
        assert_eq!(config.max_message_bytes, 16 * 1024);
    }

    #[test]
    fn port_overrides_server_addr() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "3001"),
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("LOG_FORMAT", "json"),
            ("MAX_MESSAGE_BYTES", "4096"),
        ]))
        .unwrap();
        assert_eq!(config.server_addr.port(), 3001);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.max_message_bytes, 4096);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("SERVER_ADDR", "nowhere")])),
            Err(ConfigError::InvalidAddress)
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("INPUT_RATE_LIMIT", "fast")])),
            Err(ConfigError::Invalid("INPUT_RATE_LIMIT"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("LOG_FORMAT", "xml")])),
            Err(ConfigError::Invalid("LOG_FORMAT"))
        ));
    }
}
