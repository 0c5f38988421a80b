use serde::Deserialize;
use std::collections::HashMap;

fn default_request_timeout_secs() -> u64 {
    600
}

fn default_max_body_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Total timeout for one upstream request, generous enough for slow generations.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// How long in-flight responses may run after shutdown starts.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
    /// Provider name -> real upstream host. `<PROVIDER>_REAL_HOST` overrides these.
    #[serde(default)]
    pub real_hosts: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            real_hosts: HashMap::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = AppConfig::parse("").unwrap();
        assert_eq!(cfg.request_timeout_secs, 600);
        assert_eq!(cfg.max_body_bytes, 100 * 1024 * 1024);
        assert_eq!(cfg.shutdown_timeout_secs, 30);
        assert!(cfg.real_hosts.is_empty());
    }

    #[test]
    fn real_hosts_table() {
        let cfg = AppConfig::parse(
            "request_timeout_secs = 5\n\n[real_hosts]\nanthropic = \"http://127.0.0.1:9000\"\n",
        )
        .unwrap();
        assert_eq!(cfg.request_timeout_secs, 5);
        assert_eq!(
            cfg.real_hosts.get("anthropic").map(String::as_str),
            Some("http://127.0.0.1:9000")
        );
    }

    #[test]
    fn missing_file_is_default() {
        let cfg = AppConfig::load("/nonexistent/error-proxy.toml").unwrap();
        assert_eq!(cfg.request_timeout_secs, 600);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppConfig::parse("request_timeout_secs = \"soon\"").is_err());
    }
}
