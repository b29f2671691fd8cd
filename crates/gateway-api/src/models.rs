use gateway_trust::CertificateInfo;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Number of certificates in the southbound chain
    pub certificates: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Metadata for one certificate of the southbound chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    /// Position in the chain, leaf is 0
    pub index: usize,
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub not_before: String,
    pub not_after: String,
}

impl CertificateSummary {
    pub fn new(index: usize, info: CertificateInfo) -> Self {
        Self {
            index,
            subject: info.subject,
            issuer: info.issuer,
            serial: info.serial,
            not_before: info.not_before,
            not_after: info.not_after,
        }
    }
}

/// Southbound chain metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummaryList {
    pub certificates: Vec<CertificateSummary>,
    pub total: usize,
}
