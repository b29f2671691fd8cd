//! Error types for loading and exporting southbound trust material

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::observer::MessageId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed or contradictory settings
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Key store {} is configured without a store password", location.display())]
    MissingStorePassword { location: PathBuf },

    #[error("Key alias must not be blank")]
    BlankAlias,
}

/// Failure class of a [`CryptoError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoErrorKind {
    FileNotFound,
    BadPassword,
    UnsupportedType,
    AliasNotFound,
}

impl fmt::Display for CryptoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FileNotFound => "file not found",
            Self::BadPassword => "bad password",
            Self::UnsupportedType => "unsupported type",
            Self::AliasNotFound => "alias not found",
        };
        f.write_str(name)
    }
}

/// Key store could not be opened or did not contain the requested chain
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key store {} could not be opened: {source}", location.display())]
    FileNotFound {
        location: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Key store {} could not be unlocked with the configured password: {source}",
        location.display()
    )]
    BadPassword {
        location: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Key store type {store_type} is not supported")]
    UnsupportedType { store_type: String },

    #[error(
        "Alias {} not found in key store {}",
        alias.as_deref().unwrap_or("<default>"),
        location.display()
    )]
    AliasNotFound {
        alias: Option<String>,
        location: PathBuf,
    },
}

impl CryptoError {
    pub fn kind(&self) -> CryptoErrorKind {
        match self {
            Self::FileNotFound { .. } => CryptoErrorKind::FileNotFound,
            Self::BadPassword { .. } => CryptoErrorKind::BadPassword,
            Self::UnsupportedType { .. } => CryptoErrorKind::UnsupportedType,
            Self::AliasNotFound { .. } => CryptoErrorKind::AliasNotFound,
        }
    }
}

/// Certificate bytes could not be turned into (or read back from) PEM
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Certificate #{index} is not a valid DER encoded X.509 certificate: {reason}")]
    MalformedCertificate { index: usize, reason: String },

    #[error("PEM document could not be parsed: {0}")]
    InvalidPem(#[from] std::io::Error),
}

/// Any failure while loading or exporting trust material
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

/// Stable code attached to fatal initialization failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    HttpClientInitializationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpClientInitializationFailed => "HTTP_CLIENT_INITIALIZATION_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal startup error; the gateway must not start serving after this
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("[{message_id}] Error initializing SSL context ({code}): {source}")]
    Failed {
        code: ErrorCode,
        message_id: MessageId,
        #[source]
        source: TrustError,
    },

    #[error("Southbound trust material has already been initialized")]
    AlreadyInitialized,
}

impl InitializationError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Failed { code, .. } => Some(*code),
            Self::AlreadyInitialized => None,
        }
    }

    /// The load failure behind this error, if any
    pub fn trust_error(&self) -> Option<&TrustError> {
        match self {
            Self::Failed { source, .. } => Some(source),
            Self::AlreadyInitialized => None,
        }
    }
}
