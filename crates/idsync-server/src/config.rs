use std::collections::HashMap;
use std::env;

use idsync_core::config::{value_or_default, ConfigError, EngineConfig};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "IDSYNC_BIND_ADDR", "127.0.0.1:8080");
        if bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(
                "IDSYNC_BIND_ADDR must be a socket address like 127.0.0.1:8080".to_string(),
            ));
        }

        let engine = EngineConfig::from_lookup(&lookup)?;

        Ok(Self { bind_addr, engine })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_map() -> HashMap<&'static str, &'static str> {
        let mut map = HashMap::new();
        map.insert("IDSYNC_UPSTREAM_URL", "https://identity.example.com/v1/projects/acme");
        map.insert("IDSYNC_UPSTREAM_TOKEN", "sensitive-upstream-token");
        map
    }

    #[test]
    fn config_requires_upstream_settings() {
        let map: HashMap<&str, &str> = HashMap::new();
        let err = AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("IDSYNC_UPSTREAM_URL"));
    }

    #[test]
    fn config_defaults_bind_addr() {
        let map = base_map();
        let config =
            AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string())).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn config_rejects_invalid_bind_addr() {
        let mut map = base_map();
        map.insert("IDSYNC_BIND_ADDR", "localhost");
        let err = AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("IDSYNC_BIND_ADDR"));
    }

    #[test]
    fn config_redacts_sensitive_debug_fields() {
        let map = base_map();
        let config =
            AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string())).unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-upstream-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
