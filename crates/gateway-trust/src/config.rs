//! Key store configuration

use serde::Deserialize;
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Password or other secret value that must never be logged
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Key store container format
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum KeyStoreType {
    /// PKCS#12 / PFX archive
    #[default]
    Pkcs12,
    /// Bundle of PEM encoded certificates
    Pem,
    /// Any other type name; rejected when the store is loaded
    Other(String),
}

impl KeyStoreType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pkcs12 => "PKCS12",
            Self::Pem => "PEM",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for KeyStoreType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Ok(match normalized.as_str() {
            "PKCS12" | "P12" | "PFX" => Self::Pkcs12,
            "PEM" => Self::Pem,
            _ => Self::Other(s.trim().to_string()),
        })
    }
}

impl From<String> for KeyStoreType {
    fn from(value: String) -> Self {
        match value.parse::<KeyStoreType>() {
            Ok(store_type) => store_type,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for KeyStoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how to open the key store holding the southbound certificate chain
///
/// An absent or blank `location` means no trust material is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyStoreConfig {
    location: Option<PathBuf>,
    store_password: Option<Secret>,
    key_password: Option<Secret>,
    store_type: KeyStoreType,
    alias: Option<String>,
}

impl KeyStoreConfig {
    /// Configuration pointing at a key store on disk
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Configuration with no trust material
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, location: Option<PathBuf>) -> Self {
        self.location = location;
        self
    }

    pub fn with_store_password(mut self, password: impl Into<Secret>) -> Self {
        self.store_password = Some(password.into());
        self
    }

    pub fn with_key_password(mut self, password: impl Into<Secret>) -> Self {
        self.key_password = Some(password.into());
        self
    }

    pub fn with_store_type(mut self, store_type: KeyStoreType) -> Self {
        self.store_type = store_type;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Key store location, `None` when unset or blank
    pub fn location(&self) -> Option<&Path> {
        self.location
            .as_deref()
            .filter(|path| !path.as_os_str().to_string_lossy().trim().is_empty())
    }

    pub fn store_password(&self) -> Option<&Secret> {
        self.store_password.as_ref()
    }

    pub fn key_password(&self) -> Option<&Secret> {
        self.key_password.as_ref()
    }

    pub fn store_type(&self) -> &KeyStoreType {
        &self.store_type
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Whether any trust material is configured
    pub fn is_configured(&self) -> bool {
        self.location().is_some()
    }
}
