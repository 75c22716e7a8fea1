use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BASE_PATH: &str = r"C:\Program Files (x86)\Common Files\Aspel\Sistemas Aspel";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3050;
pub const DEFAULT_USERNAME: &str = "SYSDBA";
pub const DEFAULT_PASSWORD: &str = "masterkey";

/// Process-wide settings, built once at startup and handed to the components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    pub discovery: DiscoveryConfig,
    pub connection: ConnectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Root directory whose children are installation version folders
    pub base_path: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl PricingConfig {
    /// Read settings from the environment:
    /// `ASPBASE`, `FIREBIRD_HOST`, `FIREBIRD_PORT`, `FIREBIRD_USUARIO`, `FIREBIRD_CONTRASENA`.
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Same as [`PricingConfig::from_env`] with an arbitrary variable source.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = var("FIREBIRD_PORT", &DEFAULT_PORT.to_string());
        let config = Self {
            discovery: DiscoveryConfig {
                base_path: PathBuf::from(var("ASPBASE", DEFAULT_BASE_PATH)),
            },
            connection: ConnectionConfig {
                host: var("FIREBIRD_HOST", DEFAULT_HOST),
                port: port
                    .trim()
                    .parse()
                    .with_context(|| format!("FIREBIRD_PORT is not a valid port: {}", port))?,
                username: var("FIREBIRD_USUARIO", DEFAULT_USERNAME),
                password: var("FIREBIRD_CONTRASENA", DEFAULT_PASSWORD),
            },
        };

        Ok(config)
    }
}
