//! Listener settings loaded through the `config` crate

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Address a service binds to
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// Load `{PREFIX}_HOST` and `{PREFIX}_PORT`, falling back to
    /// `0.0.0.0:{default_port}`
    pub fn load(prefix: &str, default_port: u16) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// `host:port` string suitable for `TcpListener::bind`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        unsafe {
            std::env::remove_var("FRAMEOTEST_HOST");
            std::env::remove_var("FRAMEOTEST_PORT");
        }

        let settings = ServerSettings::load("FRAMEOTEST", 3001).unwrap();
        assert_eq!(settings.address(), "0.0.0.0:3001");
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        unsafe {
            std::env::set_var("FRAMEOTEST_HOST", "127.0.0.1");
            std::env::set_var("FRAMEOTEST_PORT", "8088");
        }

        let settings = ServerSettings::load("FRAMEOTEST", 3001).unwrap();
        assert_eq!(
            settings,
            ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8088,
            }
        );

        unsafe {
            std::env::remove_var("FRAMEOTEST_HOST");
            std::env::remove_var("FRAMEOTEST_PORT");
        }
    }
}
