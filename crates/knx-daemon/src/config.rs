//! Device configuration loading.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete device configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub pools: PoolConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Device identity: serial number, individual address, installation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_serial_number")]
    pub serial_number: String,
    /// 16-bit individual address, area.line.device packed as area<<12 | line<<8 | device.
    #[serde(default = "default_individual_address")]
    pub individual_address: u16,
    #[serde(default)]
    pub installation_id: u8,
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

/// Listening ports and multicast scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_multicast_port")]
    pub multicast_port: u16,
}

/// Sizing for the bounded pools the pipeline shares across connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_buffer_count")]
    pub buffer_count: usize,
    #[serde(default = "default_pdu_size")]
    pub pdu_size: usize,
    #[serde(default = "default_replay_pool_size")]
    pub replay_pool_size: usize,
    #[serde(default = "default_blockwise_transfers")]
    pub blockwise_transfers: usize,
    #[serde(default = "default_table_capacity")]
    pub group_object_table_capacity: usize,
    #[serde(default = "default_table_capacity")]
    pub recipient_publisher_table_capacity: usize,
}

/// Persistence backend location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Empty = platform default data directory.
    #[serde(default)]
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_serial_number() -> String {
    "000000000000".to_string()
}

fn default_individual_address() -> u16 {
    0x1101
}

fn default_hostname() -> String {
    "knx-iot-device".to_string()
}

fn default_port() -> u16 {
    5683
}

fn default_multicast_port() -> u16 {
    5683
}

fn default_buffer_count() -> usize {
    16
}

fn default_pdu_size() -> usize {
    1024
}

fn default_replay_pool_size() -> usize {
    10
}

fn default_blockwise_transfers() -> usize {
    4
}

fn default_table_capacity() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            serial_number: default_serial_number(),
            individual_address: default_individual_address(),
            installation_id: 0,
            hostname: default_hostname(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            multicast_port: default_multicast_port(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            buffer_count: default_buffer_count(),
            pdu_size: default_pdu_size(),
            replay_pool_size: default_replay_pool_size(),
            blockwise_transfers: default_blockwise_transfers(),
            group_object_table_capacity: default_table_capacity(),
            recipient_publisher_table_capacity: default_table_capacity(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DeviceConfig {
    /// Load from the default config file location, falling back to defaults
    /// if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DeviceConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir().join("knx-device.sqlite3")
    }

    fn config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("KNX_DATA_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        Self::default_data_dir().join("config.toml")
    }

    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("KNX_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".knx-iot"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/knx-iot"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = DeviceConfig::default();
        assert_eq!(config.network.port, 5683);
        assert_eq!(config.pools.group_object_table_capacity, 20);
        assert_eq!(config.identity.individual_address, 0x1101);
    }

    #[test]
    fn serialization_roundtrips() {
        let config = DeviceConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: DeviceConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(parsed.network.port, config.network.port);
    }
}
