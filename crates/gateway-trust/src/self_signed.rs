//! Development key store generation
//!
//! Produces a PKCS#12 key store holding a leaf certificate signed by a freshly
//! generated CA, so the gateway can be started locally without real trust
//! material. **DO NOT use in production.**

use p12_keystore::{KeyStore, KeyStoreEntry, PrivateKeyChain};
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use std::path::Path;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::chain::{Certificate, CertificateChain};

const VALIDITY_DAYS: i64 = 90;

#[derive(Error, Debug)]
pub enum DevKeyStoreError {
    #[error("Certificate generation failed: {0}")]
    GenerationFailed(String),

    #[error("Key store encoding failed: {0}")]
    KeyStoreFailed(String),

    #[error("At least one domain is required")]
    NoDomains,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A generated development key store
pub struct DevKeyStore {
    /// Alias the leaf chain is stored under
    pub alias: String,

    /// Leaf certificate followed by the issuing CA
    pub chain: CertificateChain,

    /// PKCS#12 encoded key store
    pub pkcs12: Vec<u8>,
}

impl DevKeyStore {
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.pkcs12)
    }
}

fn generation_failed(e: impl std::fmt::Display) -> DevKeyStoreError {
    DevKeyStoreError::GenerationFailed(e.to_string())
}

fn validity(params: &mut CertificateParams) {
    let now = OffsetDateTime::now_utc();
    params.not_before = now - Duration::minutes(5);
    params.not_after = now + Duration::days(VALIDITY_DAYS);
    params.serial_number = Some(rcgen::SerialNumber::from(rand::random::<u64>()));
}

/// Generate a PKCS#12 key store protected by `password`
///
/// The leaf certificate covers `domains` (the first one becomes its common
/// name) and is signed by a one-off development CA. Both certificates are
/// stored as one private key chain under `alias`.
pub fn generate_dev_keystore(
    alias: &str,
    password: &str,
    domains: &[String],
) -> Result<DevKeyStore, DevKeyStoreError> {
    let common_name = domains.first().ok_or(DevKeyStoreError::NoDomains)?;

    let ca_key = KeyPair::generate().map_err(generation_failed)?;
    let mut ca_params = CertificateParams::default();
    let mut ca_dn = DistinguishedName::new();
    ca_dn.push(DnType::CommonName, "Gateway Development CA");
    ca_dn.push(DnType::OrganizationName, "Gateway Dev");
    ca_params.distinguished_name = ca_dn;
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    validity(&mut ca_params);
    let ca_cert = ca_params.self_signed(&ca_key).map_err(generation_failed)?;

    let leaf_key = KeyPair::generate().map_err(generation_failed)?;
    let mut leaf_params = CertificateParams::new(domains.to_vec()).map_err(generation_failed)?;
    let mut leaf_dn = DistinguishedName::new();
    leaf_dn.push(DnType::CommonName, common_name.as_str());
    leaf_dn.push(DnType::OrganizationName, "Gateway Dev");
    leaf_params.distinguished_name = leaf_dn;
    leaf_params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    leaf_params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];
    validity(&mut leaf_params);
    let leaf_cert = leaf_params
        .signed_by(&leaf_key, &ca_cert, &ca_key)
        .map_err(generation_failed)?;

    let chain = CertificateChain::new(vec![
        Certificate::from(leaf_cert.der().clone()),
        Certificate::from(ca_cert.der().clone()),
    ]);

    let stored_chain = chain
        .iter()
        .map(|cert| p12_keystore::Certificate::from_der(cert.as_der()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DevKeyStoreError::KeyStoreFailed(e.to_string()))?;
    let local_key_id = rand::random::<[u8; 20]>();
    let entry = PrivateKeyChain::new(leaf_key.serialize_der(), local_key_id, stored_chain);

    let mut keystore = KeyStore::new();
    keystore.add_entry(alias, KeyStoreEntry::PrivateKeyChain(entry));
    let pkcs12 = keystore
        .writer(password)
        .write()
        .map_err(|e| DevKeyStoreError::KeyStoreFailed(e.to_string()))?;

    info!(
        "Generated development key store for {} (alias {}, valid {} days)",
        common_name, alias, VALIDITY_DAYS
    );

    Ok(DevKeyStore {
        alias: alias.to_string(),
        chain,
        pkcs12,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_dev_keystore() {
        let store =
            generate_dev_keystore("gateway", "changeit", &["localhost".to_string()]).unwrap();

        assert_eq!(store.alias, "gateway");
        assert_eq!(store.chain.len(), 2);
        assert!(!store.pkcs12.is_empty());

        let leaf = store.chain.leaf().unwrap().info().unwrap();
        let ca = store.chain.as_slice()[1].info().unwrap();
        assert!(leaf.subject.contains("localhost"));
        assert_eq!(leaf.issuer, ca.subject);
    }

    #[test]
    fn test_generate_requires_domain() {
        let result = generate_dev_keystore("gateway", "changeit", &[]);
        assert!(matches!(result, Err(DevKeyStoreError::NoDomains)));
    }
}
