use std::net::SocketAddr;
use std::path::PathBuf;

use toner_core::TransitionPolicy;

/// Server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: PathBuf,
    pub policy: TransitionPolicy,
    pub write_rate_per_sec: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = std::env::var("TONER_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("TONER_LISTEN_ADDR", "must be a valid socket address")
            })?;

        let db_path = std::env::var("TONER_DB_PATH")
            .unwrap_or_else(|_| "./toner.redb".to_string())
            .into();

        let strict_service_cycle = match std::env::var("TONER_STRICT_SERVICE_CYCLE") {
            Ok(s) => parse_bool(&s).ok_or(ConfigError::Invalid(
                "TONER_STRICT_SERVICE_CYCLE",
                "must be true or false",
            ))?,
            Err(_) => false,
        };

        let write_rate_per_sec = match std::env::var("TONER_WRITE_RATE_PER_SEC") {
            Ok(s) => s
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid(
                    "TONER_WRITE_RATE_PER_SEC",
                    "must be a positive integer",
                ))?,
            Err(_) => 5,
        };

        Ok(Config {
            listen_addr,
            db_path,
            policy: TransitionPolicy {
                strict_service_cycle,
            },
            write_rate_per_sec,
        })
    }

    /// Create a test configuration.
    pub fn for_testing() -> Self {
        Config {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            db_path: PathBuf::from("/tmp/toner-test.redb"),
            policy: TransitionPolicy::default(),
            write_rate_per_sec: 1000,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" ON "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_for_testing_is_lenient() {
        let config = Config::for_testing();
        assert!(!config.policy.strict_service_cycle);
        assert!(config.write_rate_per_sec > 100);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("TONER_DB_PATH", "bad");
        assert_eq!(err.to_string(), "Invalid value for TONER_DB_PATH: bad");
    }
}
