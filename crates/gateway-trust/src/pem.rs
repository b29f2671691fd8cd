//! PEM serialization of certificate chains

use ::pem::{encode_config, EncodeConfig, LineEnding, Pem};
use std::fmt;

use crate::chain::{parse_der, Certificate, CertificateChain};
use crate::error::EncodingError;

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const BEGIN_CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----";
const LINE_WIDTH: usize = 64;

/// Zero or more `CERTIFICATE` PEM blocks, in chain order
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PemDocument(String);

impl PemDocument {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of certificate blocks in the document
    pub fn block_count(&self) -> usize {
        self.0.matches(BEGIN_CERTIFICATE).count()
    }

    /// Parse the document back into a chain
    pub fn decode(&self) -> Result<CertificateChain, EncodingError> {
        decode_certificates(self.0.as_bytes())
    }
}

impl fmt::Display for PemDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PemDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Read every `CERTIFICATE` block from PEM text, ignoring other block types
pub(crate) fn decode_certificates(mut pem: &[u8]) -> Result<CertificateChain, EncodingError> {
    let certs = rustls_pemfile::certs(&mut pem).collect::<Result<Vec<_>, _>>()?;
    Ok(certs.into_iter().map(Certificate::from).collect())
}

/// Converts certificate chains to PEM text
#[derive(Debug, Clone, Copy, Default)]
pub struct PemEncoder;

impl PemEncoder {
    /// Encode every certificate of `chain`, or fail without producing any text
    ///
    /// An empty chain encodes to an empty document.
    pub fn encode(chain: &CertificateChain) -> Result<PemDocument, EncodingError> {
        for (index, cert) in chain.iter().enumerate() {
            parse_der(cert.as_der(), index)?;
        }

        let config = EncodeConfig::new()
            .set_line_ending(LineEnding::LF)
            .set_line_wrap(LINE_WIDTH);
        let out = chain
            .iter()
            .map(|cert| encode_config(&Pem::new(CERTIFICATE_TAG, cert.as_der()), config))
            .collect::<String>();
        Ok(PemDocument(out))
    }
}
