//! Key store loading

use p12_keystore::{KeyStore, KeyStoreEntry};
use std::path::Path;
use tracing::{debug, info};

use crate::chain::{Certificate, CertificateChain};
use crate::config::{KeyStoreConfig, KeyStoreType};
use crate::error::{ConfigurationError, CryptoError, TrustError};
use crate::pem::decode_certificates;

/// Source of the southbound certificate chain
#[cfg_attr(test, mockall::automock)]
pub trait KeyStoreLoader: Send + Sync {
    /// Load the chain described by `config`
    ///
    /// Returns an empty chain when no key store location is configured.
    fn load(&self, config: &KeyStoreConfig) -> Result<CertificateChain, TrustError>;
}

/// Reads key stores from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileKeyStoreLoader;

impl KeyStoreLoader for FileKeyStoreLoader {
    fn load(&self, config: &KeyStoreConfig) -> Result<CertificateChain, TrustError> {
        let Some(location) = config.location() else {
            debug!("No key store location configured");
            return Ok(CertificateChain::empty());
        };

        if matches!(config.alias(), Some(alias) if alias.trim().is_empty()) {
            return Err(ConfigurationError::BlankAlias.into());
        }

        let chain = match config.store_type() {
            KeyStoreType::Pkcs12 => load_pkcs12(config, location)?,
            KeyStoreType::Pem => load_pem(location)?,
            KeyStoreType::Other(name) => {
                return Err(CryptoError::UnsupportedType {
                    store_type: name.clone(),
                }
                .into())
            }
        };

        info!(
            "Loaded {} certificate(s) from {} key store {}",
            chain.len(),
            config.store_type(),
            location.display()
        );
        Ok(chain)
    }
}

fn read_store(location: &Path) -> Result<Vec<u8>, CryptoError> {
    std::fs::read(location).map_err(|source| CryptoError::FileNotFound {
        location: location.to_path_buf(),
        source,
    })
}

fn load_pkcs12(config: &KeyStoreConfig, location: &Path) -> Result<CertificateChain, TrustError> {
    let password = config
        .store_password()
        .ok_or_else(|| ConfigurationError::MissingStorePassword {
            location: location.to_path_buf(),
        })?;

    if config.key_password().is_some_and(|key| key != password) {
        debug!(
            "Key password differs from store password, certificates are read with the store password"
        );
    }

    let data = read_store(location)?;
    let keystore = KeyStore::from_pkcs12(&data, password.expose()).map_err(|e| {
        CryptoError::BadPassword {
            location: location.to_path_buf(),
            source: e.into(),
        }
    })?;

    let chain = select_chain(&keystore, config.alias()).ok_or_else(|| {
        CryptoError::AliasNotFound {
            alias: config.alias().map(str::to_string),
            location: location.to_path_buf(),
        }
    })?;
    Ok(chain)
}

/// Chain stored under `alias`, or the store default when no alias is given
///
/// PKCS#12 aliases are matched case-insensitively. The default is the first
/// private key entry in alias order, falling back to the first trusted
/// certificate entry.
fn select_chain(keystore: &KeyStore, alias: Option<&str>) -> Option<CertificateChain> {
    let mut entries: Vec<(String, &KeyStoreEntry)> = keystore
        .entries()
        .map(|(name, entry)| (name.to_string(), entry))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let (name, entry) = match alias {
        Some(alias) => entries
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(alias.trim()))?,
        None => {
            if entries.is_empty() {
                return None;
            }
            let position = entries
                .iter()
                .position(|(_, entry)| matches!(entry, KeyStoreEntry::PrivateKeyChain(_)))
                .unwrap_or(0);
            entries.swap_remove(position)
        }
    };

    let chain = entry_chain(entry);
    debug!("Key store entry {} holds {} certificate(s)", name, chain.len());
    (!chain.is_empty()).then_some(chain)
}

fn entry_chain(entry: &KeyStoreEntry) -> CertificateChain {
    match entry {
        KeyStoreEntry::PrivateKeyChain(key_chain) => key_chain
            .chain()
            .iter()
            .map(|cert| Certificate::from_der(cert.as_der()))
            .collect(),
        KeyStoreEntry::Certificate(cert) => {
            CertificateChain::new(vec![Certificate::from_der(cert.as_der())])
        }
    }
}

fn load_pem(location: &Path) -> Result<CertificateChain, TrustError> {
    let data = read_store(location)?;
    let chain = decode_certificates(&data)?;
    if chain.is_empty() {
        return Err(CryptoError::AliasNotFound {
            alias: None,
            location: location.to_path_buf(),
        }
        .into());
    }
    Ok(chain)
}
