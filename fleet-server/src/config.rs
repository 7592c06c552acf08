use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub devices: DevicesConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address for the HTTP server to listen on
    pub http_addr: SocketAddr,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegistryConfig {
    Memory,
    Sqlite {
        path: PathBuf,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

#[derive(Debug, Deserialize)]
pub struct DevicesConfig {
    /// CSV file listing the fleet, reconciled into the registry at startup
    pub source: PathBuf,
}

fn default_max_connections() -> u32 {
    4
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                http_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 6733)),
            },
            registry: RegistryConfig::Sqlite {
                path: PathBuf::from("fleet_monitoring.db"),
                max_connections: default_max_connections(),
            },
            devices: DevicesConfig {
                source: PathBuf::from("devices.csv"),
            },
        }
    }
}
