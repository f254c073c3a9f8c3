//! Configuration management for the Tandem FTP server
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `TANDEM_FTP_*` environment variables. Command-line flags are applied on
//! top by the binary.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete server configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    // ═══ NETWORK ═══
    /// IP address the control listener binds to
    pub bind_address: String,

    /// Port for the control connection; 0 picks a free port
    pub control_port: u16,

    /// IPv4 address advertised in PASV replies
    pub passive_address: String,

    /// Port range `[min, max)` for passive listeners
    pub data_port_min: u16,
    pub data_port_max: u16,

    /// Timeout for active-mode outbound connects
    pub data_connect_timeout_secs: u64,

    // ═══ FILES ═══
    /// Root directory exposed to clients
    pub server_root: String,

    /// Chunk size used by the transfer engine
    pub buffer_size: usize,

    /// Maximum bytes read for one control line
    pub max_command_length: usize,

    /// Whether STOR clears a pending REST offset like RETR does
    pub store_resets_offset: bool,

    // ═══ AUTH ═══
    /// Username → password table; empty accepts every login
    pub users: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            control_port: 21,
            passive_address: "127.0.0.1".to_string(),
            data_port_min: 20000,
            data_port_max: 65535,
            data_connect_timeout_secs: 10,
            server_root: "/tmp".to_string(),
            buffer_size: 8192,
            max_command_length: 8191,
            store_resets_offset: false,
            users: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `path` (or `./config.toml` when present)
    /// with environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("config").required(false),
        };

        let config: ServerConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("TANDEM_FTP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_port_min >= self.data_port_max {
            return Err(ConfigError::Message(
                "data_port_min must be less than data_port_max".into(),
            ));
        }

        if self.bind_ip().is_none() {
            return Err(ConfigError::Message(format!(
                "bind_address is not an IP address: {}",
                self.bind_address
            )));
        }

        if self.passive_ip().is_none() {
            return Err(ConfigError::Message(format!(
                "passive_address must be an IPv4 address: {}",
                self.passive_address
            )));
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 {
            return Err(ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        if self.data_connect_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "data_connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.server_root.is_empty() {
            return Err(ConfigError::Message("server_root cannot be empty".into()));
        }

        Ok(())
    }

    /// Applies a host address given on the command line.
    ///
    /// The control listener binds to it, and a concrete IPv4 address is
    /// also what PASV replies advertise.
    pub fn set_host_address(&mut self, address: &str) {
        self.bind_address = address.to_string();
        if let Ok(ip) = address.parse::<Ipv4Addr>() {
            if !ip.is_unspecified() {
                self.passive_address = ip.to_string();
            }
        }
    }

    /// Get bind address and control port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    pub fn bind_ip(&self) -> Option<IpAddr> {
        self.bind_address.parse().ok()
    }

    pub fn passive_ip(&self) -> Option<Ipv4Addr> {
        self.passive_address.parse().ok()
    }

    /// Get data port range for PASV mode
    pub fn data_port_range(&self) -> std::ops::Range<u16> {
        self.data_port_min..self.data_port_max
    }

    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.data_connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.data_port_range(), 20000..65535);
        assert_eq!(config.control_socket(), "0.0.0.0:21");
    }

    #[test]
    fn rejects_bad_values() {
        let inverted = ServerConfig {
            data_port_min: 30000,
            data_port_max: 30000,
            ..ServerConfig::default()
        };
        assert!(inverted.validate().is_err());

        let hostname = ServerConfig {
            passive_address: "ftp.example.com".into(),
            ..ServerConfig::default()
        };
        assert!(hostname.validate().is_err());

        let no_buffer = ServerConfig {
            buffer_size: 0,
            ..ServerConfig::default()
        };
        assert!(no_buffer.validate().is_err());
    }

    #[test]
    fn host_address_is_advertised_for_passive_mode() {
        let mut config = ServerConfig::default();
        config.set_host_address("10.0.0.5");
        assert_eq!(config.bind_address, "10.0.0.5");
        assert_eq!(config.passive_ip(), Some(Ipv4Addr::new(10, 0, 0, 5)));

        // A wildcard or IPv6 bind keeps the configured advertised address
        let mut config = ServerConfig::default();
        config.set_host_address("0.0.0.0");
        assert_eq!(config.passive_address, "127.0.0.1");
        config.set_host_address("::1");
        assert_eq!(config.bind_address, "::1");
        assert_eq!(config.passive_address, "127.0.0.1");
        config.validate().unwrap();
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "control_port = 2121").unwrap();
        writeln!(file, "store_resets_offset = true").unwrap();
        writeln!(file, "[users]").unwrap();
        writeln!(file, "alice = \"secret\"").unwrap();

        let config = ServerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.control_port, 2121);
        assert!(config.store_resets_offset);
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.users.get("alice").map(String::as_str), Some("secret"));
    }
}
