use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use validator::Validate;

use crate::simulation::NoiseConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub generator: GeneratorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: false,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneratorConfig {
    /// Longest range a single telemetry request may span
    #[validate(range(min = 1, max = 31))]
    pub max_range_days: u32,
    #[validate(nested)]
    #[serde(default)]
    pub noise: NoiseConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_range_days: 7,
            noise: NoiseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,hyper=warn,tower_http=info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("TELEMETRY__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::from_figment(Figment::from(Serialized::defaults(Config::default())))
            .unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.generator.max_range_days, 7);
        assert_eq!(cfg.generator.noise, NoiseConfig::default());
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_toml_overrides() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
            r#"
            [server]
            port = 8002

            [generator.noise]
            step_probability = 0.5

            [logging]
            format = "pretty"
            "#,
        ));
        let cfg = Config::from_figment(figment).unwrap();
        assert_eq!(cfg.server.port, 8002);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.generator.noise.step_probability, 0.5);
        assert_eq!(cfg.generator.noise.high_frequency_std, 0.01);
        assert_eq!(cfg.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
            r#"
            [generator]
            max_range_days = 0
            "#,
        ));
        assert!(Config::from_figment(figment).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().port(), 8000);
    }
}
