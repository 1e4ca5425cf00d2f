// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig, MountConfig, PerformanceConfig, ServerConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("ZIPSERVE"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.api_host", "127.0.0.1")?
            .set_default("server.api_port", 8000)?
            .set_default("server.autostart", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from the default "config.toml"
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn get_api_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.api_host, self.server.api_port)
            .parse()
            .map_err(|e| format!("Invalid API address: {e}"))
    }
}

/// Check that a mount name is usable as a single URL path segment
pub fn is_valid_mount_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('?') && !name.contains('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_name_validation() {
        assert!(is_valid_mount_name("archive"));
        assert!(is_valid_mount_name("my-archive.v2"));
        assert!(!is_valid_mount_name(""));
        assert!(!is_valid_mount_name("a/b"));
        assert!(!is_valid_mount_name("a?b"));
        assert!(!is_valid_mount_name("a#b"));
    }
}
