//! Operator-facing diagnostics for trust material loading and export
//!
//! Components report through a [`TrustObserver`] handed to them at construction
//! time. [`TracingObserver`] forwards every report to `tracing`.

use std::fmt;
use tracing::{debug, error, info};

use crate::chain::CertificateChain;
use crate::error::{EncodingError, TrustError};

/// Stable identifiers for operator-facing diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Southbound trust material could not be loaded at startup
    SslContextInitializationFailed,
    /// Loaded certificates could not be converted to PEM
    PemConversionFailed,
    /// Loaded certificates could not be parsed for inspection
    CertificateInspectionFailed,
}

impl MessageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SslContextInitializationFailed => "TRUST0001E",
            Self::PemConversionFailed => "TRUST0002E",
            Self::CertificateInspectionFailed => "TRUST0003E",
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives lifecycle reports from the trust initializer and the PEM export path
pub trait TrustObserver: Send + Sync {
    /// Trust material loaded; `chain` may be empty when nothing is configured
    fn chain_loaded(&self, chain: &CertificateChain);

    /// Startup load failed; the gateway is about to abort
    fn initialization_failed(&self, message_id: MessageId, error: &TrustError);

    /// PEM export or inspection failed after startup; the gateway keeps running
    fn encoding_failed(&self, message_id: MessageId, error: &EncodingError);
}

/// Observer that writes structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TrustObserver for TracingObserver {
    fn chain_loaded(&self, chain: &CertificateChain) {
        if chain.is_empty() {
            info!("No southbound key store configured, certificate chain is empty");
            return;
        }

        info!(
            certificates = chain.len(),
            "Southbound certificate chain loaded"
        );
        for (index, cert) in chain.iter().enumerate() {
            if let Ok(meta) = cert.info() {
                debug!(index, subject = %meta.subject, issuer = %meta.issuer, "Chain certificate");
            }
        }
    }

    fn initialization_failed(&self, message_id: MessageId, error: &TrustError) {
        error!(message_id = %message_id, "Error initializing SSL context: {}", error);
    }

    fn encoding_failed(&self, message_id: MessageId, error: &EncodingError) {
        let action = match message_id {
            MessageId::CertificateInspectionFailed => "inspect",
            _ => "convert to PEM format",
        };
        error!(
            message_id = %message_id,
            "Failed to {} a southbound certificate: {}", action, error
        );
    }
}

impl<T: TrustObserver + ?Sized> TrustObserver for std::sync::Arc<T> {
    fn chain_loaded(&self, chain: &CertificateChain) {
        (**self).chain_loaded(chain)
    }

    fn initialization_failed(&self, message_id: MessageId, error: &TrustError) {
        (**self).initialization_failed(message_id, error)
    }

    fn encoding_failed(&self, message_id: MessageId, error: &EncodingError) {
        (**self).encoding_failed(message_id, error)
    }
}
