//! Southbound trust material for the gateway
//!
//! Loads the certificate chain the gateway presents on outbound TLS connections
//! from a key store, publishes it once at startup, and exports it as PEM text.
//!
//! ```no_run
//! use gateway_trust::{FileKeyStoreLoader, KeyStoreConfig, TracingObserver, TrustInitializer};
//!
//! let config = KeyStoreConfig::new("/etc/gateway/keystore.p12").with_store_password("secret");
//! let mut initializer = TrustInitializer::new(config, FileKeyStoreLoader, TracingObserver);
//! let trust = initializer.initialize().expect("southbound trust material");
//! let pem = trust.certificates_in_pem_format().unwrap();
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod initializer;
pub mod loader;
pub mod observer;
pub mod pem;
pub mod self_signed;

pub use chain::{Certificate, CertificateChain, CertificateInfo};
pub use config::{KeyStoreConfig, KeyStoreType, Secret};
pub use error::{
    ConfigurationError, CryptoError, CryptoErrorKind, EncodingError, ErrorCode,
    InitializationError, TrustError,
};
pub use initializer::{SouthboundTrust, TrustInitializer, TrustState};
pub use loader::{FileKeyStoreLoader, KeyStoreLoader};
pub use observer::{MessageId, TracingObserver, TrustObserver};
pub use pem::{PemDocument, PemEncoder};
pub use self_signed::{generate_dev_keystore, DevKeyStore, DevKeyStoreError};
