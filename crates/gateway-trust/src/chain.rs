//! Immutable certificate chain

use rustls::pki_types::CertificateDer;
use serde::Serialize;
use std::sync::Arc;
use x509_parser::certificate::X509Certificate;

use crate::error::EncodingError;

/// Single DER encoded certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: CertificateDer<'static>,
}

/// Metadata derived from a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub not_before: String,
    pub not_after: String,
}

impl Certificate {
    /// Wrap DER bytes without validating them
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self {
            der: CertificateDer::from(der.into()),
        }
    }

    pub fn as_der(&self) -> &[u8] {
        self.der.as_ref()
    }

    pub fn to_rustls(&self) -> CertificateDer<'static> {
        self.der.clone()
    }

    /// Subject, issuer, serial and validity of this certificate
    pub fn info(&self) -> Result<CertificateInfo, EncodingError> {
        self.info_at(0)
    }

    fn info_at(&self, index: usize) -> Result<CertificateInfo, EncodingError> {
        let cert = parse_der(self.as_der(), index)?;
        Ok(CertificateInfo {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.raw_serial_as_string(),
            not_before: cert.validity().not_before.to_string(),
            not_after: cert.validity().not_after.to_string(),
        })
    }
}

impl From<CertificateDer<'static>> for Certificate {
    fn from(der: CertificateDer<'static>) -> Self {
        Self { der }
    }
}

/// Parse `der` as exactly one X.509 certificate; `index` only labels the error
pub(crate) fn parse_der(der: &[u8], index: usize) -> Result<X509Certificate<'_>, EncodingError> {
    match x509_parser::parse_x509_certificate(der) {
        Ok((rest, _)) if !rest.is_empty() => Err(EncodingError::MalformedCertificate {
            index,
            reason: format!("{} trailing bytes after certificate", rest.len()),
        }),
        Ok((_, cert)) => Ok(cert),
        Err(e) => Err(EncodingError::MalformedCertificate {
            index,
            reason: e.to_string(),
        }),
    }
}

/// Ordered certificate chain, leaf first, as stored in the key store
///
/// Clones share storage. The chain is never modified after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    certificates: Arc<[Certificate]>,
}

impl Default for CertificateChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CertificateChain {
    pub fn new(certificates: Vec<Certificate>) -> Self {
        Self {
            certificates: certificates.into(),
        }
    }

    /// Chain representing "no trust material configured"
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates.iter()
    }

    pub fn as_slice(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Leaf certificate, if any
    pub fn leaf(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    /// Metadata for every certificate, failing on the first one that cannot be parsed
    pub fn info(&self) -> Result<Vec<CertificateInfo>, EncodingError> {
        self.iter()
            .enumerate()
            .map(|(index, cert)| cert.info_at(index))
            .collect()
    }

    /// Chain in the form rustls client configs expect
    pub fn to_rustls(&self) -> Vec<CertificateDer<'static>> {
        self.iter().map(Certificate::to_rustls).collect()
    }
}

impl FromIterator<Certificate> for CertificateChain {
    fn from_iter<I: IntoIterator<Item = Certificate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain() {
        let chain = CertificateChain::empty();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
        assert!(chain.leaf().is_none());
    }

    #[test]
    fn test_chain_preserves_order() {
        let chain: CertificateChain = vec![
            Certificate::from_der(vec![1, 2, 3]),
            Certificate::from_der(vec![4, 5, 6]),
        ]
        .into_iter()
        .collect();

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.leaf().unwrap().as_der(), &[1, 2, 3]);
        assert_eq!(chain.as_slice()[1].as_der(), &[4, 5, 6]);
    }

    #[test]
    fn test_clones_share_storage() {
        let chain = CertificateChain::new(vec![Certificate::from_der(vec![0x30, 0x00])]);
        let clone = chain.clone();
        assert!(Arc::ptr_eq(&chain.certificates, &clone.certificates));
    }

    #[test]
    fn test_to_rustls_keeps_der() {
        let chain = CertificateChain::new(vec![
            Certificate::from_der(vec![1]),
            Certificate::from_der(vec![2]),
        ]);

        let ders = chain.to_rustls();
        assert_eq!(ders.len(), 2);
        assert_eq!(ders[1].as_ref(), &[2]);
    }

    #[test]
    fn test_info_rejects_garbage() {
        let cert = Certificate::from_der(vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(
            cert.info(),
            Err(EncodingError::MalformedCertificate { index: 0, .. })
        ));
    }

    #[test]
    fn test_chain_info_reports_failing_index() {
        let generated = rcgen::generate_simple_self_signed(vec!["gateway.local".to_string()])
            .unwrap();
        let chain = CertificateChain::new(vec![
            Certificate::from(generated.cert.der().clone()),
            Certificate::from_der(vec![0xde, 0xad]),
        ]);

        assert!(matches!(
            chain.info(),
            Err(EncodingError::MalformedCertificate { index: 1, .. })
        ));
        assert_eq!(CertificateChain::empty().info().unwrap(), Vec::new());
    }

    #[test]
    fn test_info_reads_subject() {
        let generated = rcgen::generate_simple_self_signed(vec!["gateway.local".to_string()])
            .unwrap();
        let cert = Certificate::from(generated.cert.der().clone());

        let info = cert.info().unwrap();
        assert!(!info.subject.is_empty());
        assert_eq!(info.subject, info.issuer);
    }
}
