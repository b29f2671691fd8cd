//! Gateway configuration file support
//!
//! The optional YAML file mirrors the command-line flags:
//!
//! ```yaml
//! ssl:
//!   key_store: /etc/gateway/keystore.p12
//!   key_store_password: changeit
//!   key_store_type: PKCS12
//!   key_alias: gateway
//! ```

use anyhow::{Context, Result};
use gateway_trust::{KeyStoreConfig, KeyStoreType, Secret};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Gateway configuration file format
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GatewayConfig {
    /// Southbound TLS settings
    #[serde(default)]
    pub ssl: SslSettings,
}

/// Key store settings, each one optional
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct SslSettings {
    pub key_store: Option<PathBuf>,
    pub key_store_password: Option<Secret>,
    pub key_password: Option<Secret>,
    pub key_store_type: Option<KeyStoreType>,
    pub key_alias: Option<String>,
}

impl GatewayConfig {
    /// Load config from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&content)
    }

    /// Parse config from YAML string
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse YAML config")
    }
}

impl SslSettings {
    /// Settings from `overrides` win over `self`
    pub fn merge(self, overrides: SslSettings) -> SslSettings {
        SslSettings {
            key_store: overrides.key_store.or(self.key_store),
            key_store_password: overrides.key_store_password.or(self.key_store_password),
            key_password: overrides.key_password.or(self.key_password),
            key_store_type: overrides.key_store_type.or(self.key_store_type),
            key_alias: overrides.key_alias.or(self.key_alias),
        }
    }

    pub fn into_key_store_config(self) -> KeyStoreConfig {
        let mut config = KeyStoreConfig::unconfigured()
            .with_location(self.key_store)
            .with_store_type(self.key_store_type.unwrap_or_default());

        if let Some(password) = self.key_store_password {
            config = config.with_store_password(password);
        }
        if let Some(password) = self.key_password {
            config = config.with_key_password(password);
        }
        if let Some(alias) = self.key_alias {
            config = config.with_alias(alias);
        }
        config
    }
}
