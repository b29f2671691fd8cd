//! Startup initialization of southbound trust material
//!
//! [`TrustInitializer`] runs once, before the gateway serves traffic. It either
//! publishes a [`SouthboundTrust`] handle or fails startup with an
//! [`InitializationError`]. There is no reload path: the published chain lives
//! for the rest of the process.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::chain::{CertificateChain, CertificateInfo};
use crate::config::KeyStoreConfig;
use crate::error::{EncodingError, ErrorCode, InitializationError};
use crate::loader::KeyStoreLoader;
use crate::observer::{MessageId, TrustObserver};
use crate::pem::{PemDocument, PemEncoder};

/// Lifecycle of the trust initializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

/// Loads the configured key store once and publishes the result
pub struct TrustInitializer<L> {
    config: KeyStoreConfig,
    loader: L,
    observer: Arc<dyn TrustObserver>,
    state: TrustState,
}

impl<L: KeyStoreLoader> TrustInitializer<L> {
    pub fn new(config: KeyStoreConfig, loader: L, observer: impl TrustObserver + 'static) -> Self {
        Self {
            config,
            loader,
            observer: Arc::new(observer),
            state: TrustState::Uninitialized,
        }
    }

    pub fn state(&self) -> TrustState {
        self.state
    }

    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    /// Load the key store and publish its chain
    ///
    /// Only the first call does any work. Later calls return
    /// [`InitializationError::AlreadyInitialized`] and leave the state as is.
    pub fn initialize(&mut self) -> Result<SouthboundTrust, InitializationError> {
        if self.state != TrustState::Uninitialized {
            return Err(InitializationError::AlreadyInitialized);
        }

        self.state = TrustState::Loading;
        debug!("Loading southbound trust material");

        match self.loader.load(&self.config) {
            Ok(chain) => {
                self.observer.chain_loaded(&chain);
                self.state = TrustState::Ready;
                Ok(SouthboundTrust {
                    chain,
                    observer: Arc::clone(&self.observer),
                })
            }
            Err(source) => {
                self.state = TrustState::Failed;
                let message_id = MessageId::SslContextInitializationFailed;
                self.observer.initialization_failed(message_id, &source);
                Err(InitializationError::Failed {
                    code: ErrorCode::HttpClientInitializationFailed,
                    message_id,
                    source,
                })
            }
        }
    }
}

/// Published, read-only southbound trust material
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct SouthboundTrust {
    chain: CertificateChain,
    observer: Arc<dyn TrustObserver>,
}

impl SouthboundTrust {
    pub fn chain(&self) -> &CertificateChain {
        &self.chain
    }

    /// Whether a key store was configured
    pub fn is_configured(&self) -> bool {
        !self.chain.is_empty()
    }

    /// The handle only exists once initialization succeeded
    pub fn state(&self) -> TrustState {
        TrustState::Ready
    }

    /// The certificate chain as concatenated PEM blocks
    ///
    /// Returns an empty document when no trust material is configured. An
    /// encoding failure is reported to the observer and returned to the caller.
    pub fn certificates_in_pem_format(&self) -> Result<PemDocument, EncodingError> {
        PemEncoder::encode(&self.chain).inspect_err(|e| {
            self.observer
                .encoding_failed(MessageId::PemConversionFailed, e)
        })
    }

    /// Metadata for each certificate of the chain, leaf first
    ///
    /// A certificate that cannot be parsed is reported to the observer and
    /// returned to the caller.
    pub fn certificate_info(&self) -> Result<Vec<CertificateInfo>, EncodingError> {
        self.chain.info().inspect_err(|e| {
            self.observer
                .encoding_failed(MessageId::CertificateInspectionFailed, e)
        })
    }
}

impl fmt::Debug for SouthboundTrust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SouthboundTrust")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Certificate;
    use crate::error::{CryptoError, TrustError};
    use crate::loader::MockKeyStoreLoader;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl TrustObserver for RecordingObserver {
        fn chain_loaded(&self, chain: &CertificateChain) {
            self.events
                .lock()
                .unwrap()
                .push(format!("loaded:{}", chain.len()));
        }

        fn initialization_failed(&self, message_id: MessageId, _error: &TrustError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failed:{}", message_id));
        }

        fn encoding_failed(&self, message_id: MessageId, _error: &EncodingError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("encoding:{}", message_id));
        }
    }

    fn valid_certificate() -> Certificate {
        let generated = rcgen::generate_simple_self_signed(vec!["gateway.local".to_string()])
            .unwrap();
        Certificate::from(generated.cert.der().clone())
    }

    fn quiet_initializer(
        config: KeyStoreConfig,
        loader: MockKeyStoreLoader,
    ) -> TrustInitializer<MockKeyStoreLoader> {
        TrustInitializer::new(config, loader, RecordingObserver::default())
    }

    #[test]
    fn test_initialize_without_key_store_reaches_ready() {
        let mut loader = MockKeyStoreLoader::new();
        loader
            .expect_load()
            .times(1)
            .returning(|_| Ok(CertificateChain::empty()));

        let observer = Arc::new(RecordingObserver::default());
        let mut initializer =
            TrustInitializer::new(KeyStoreConfig::unconfigured(), loader, observer.clone());
        assert_eq!(initializer.state(), TrustState::Uninitialized);

        let trust = initializer.initialize().unwrap();
        assert_eq!(initializer.state(), TrustState::Ready);
        assert!(!trust.is_configured());
        assert_eq!(trust.certificates_in_pem_format().unwrap().as_str(), "");
        assert_eq!(observer.events(), vec!["loaded:0".to_string()]);
    }

    #[test]
    fn test_initialize_failure_is_fatal() {
        let mut loader = MockKeyStoreLoader::new();
        loader.expect_load().times(1).returning(|_| {
            Err(TrustError::Crypto(CryptoError::FileNotFound {
                location: PathBuf::from("/missing.p12"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }))
        });

        let observer = Arc::new(RecordingObserver::default());
        let mut initializer = TrustInitializer::new(
            KeyStoreConfig::new("/missing.p12").with_store_password("pw"),
            loader,
            observer.clone(),
        );

        let err = initializer.initialize().unwrap_err();
        assert_eq!(initializer.state(), TrustState::Failed);
        assert_eq!(err.code(), Some(ErrorCode::HttpClientInitializationFailed));
        assert!(matches!(err.trust_error(), Some(TrustError::Crypto(_))));
        assert_eq!(observer.events(), vec!["failed:TRUST0001E".to_string()]);
    }

    #[test]
    fn test_initialize_runs_only_once() {
        let mut loader = MockKeyStoreLoader::new();
        loader
            .expect_load()
            .times(1)
            .returning(|_| Ok(CertificateChain::empty()));

        let mut initializer = quiet_initializer(KeyStoreConfig::unconfigured(), loader);

        initializer.initialize().unwrap();
        let err = initializer.initialize().unwrap_err();
        assert!(matches!(err, InitializationError::AlreadyInitialized));
        assert_eq!(initializer.state(), TrustState::Ready);
    }

    #[test]
    fn test_failed_initializer_stays_failed() {
        let mut loader = MockKeyStoreLoader::new();
        loader.expect_load().times(1).returning(|_| {
            Err(TrustError::Crypto(CryptoError::UnsupportedType {
                store_type: "JKS".to_string(),
            }))
        });

        let mut initializer = quiet_initializer(KeyStoreConfig::new("/ks.jks"), loader);

        assert!(initializer.initialize().is_err());
        assert!(matches!(
            initializer.initialize(),
            Err(InitializationError::AlreadyInitialized)
        ));
        assert_eq!(initializer.state(), TrustState::Failed);
    }

    #[test]
    fn test_pem_export_is_idempotent() {
        let chain = CertificateChain::new(vec![valid_certificate()]);
        let mut loader = MockKeyStoreLoader::new();
        loader
            .expect_load()
            .returning(move |_| Ok(chain.clone()));

        let mut initializer = quiet_initializer(KeyStoreConfig::new("/ks.p12"), loader);
        let trust = initializer.initialize().unwrap();

        let first = trust.certificates_in_pem_format().unwrap();
        let second = trust.certificates_in_pem_format().unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(first.block_count(), 1);
    }

    #[test]
    fn test_encoding_failure_keeps_ready_state() {
        let chain = CertificateChain::new(vec![
            valid_certificate(),
            Certificate::from_der(vec![0xba, 0xad]),
        ]);
        let mut loader = MockKeyStoreLoader::new();
        loader
            .expect_load()
            .returning(move |_| Ok(chain.clone()));

        let observer = Arc::new(RecordingObserver::default());
        let mut initializer =
            TrustInitializer::new(KeyStoreConfig::new("/ks.p12"), loader, observer.clone());
        let trust = initializer.initialize().unwrap();

        let result = trust.certificates_in_pem_format();
        assert!(matches!(
            result,
            Err(EncodingError::MalformedCertificate { index: 1, .. })
        ));
        assert_eq!(initializer.state(), TrustState::Ready);
        assert_eq!(trust.state(), TrustState::Ready);
        assert_eq!(
            observer.events(),
            vec!["loaded:2".to_string(), "encoding:TRUST0002E".to_string()]
        );
    }

    #[test]
    fn test_inspection_failure_is_reported_separately() {
        let chain = CertificateChain::new(vec![Certificate::from_der(vec![0xba, 0xad])]);
        let mut loader = MockKeyStoreLoader::new();
        loader
            .expect_load()
            .returning(move |_| Ok(chain.clone()));

        let observer = Arc::new(RecordingObserver::default());
        let mut initializer =
            TrustInitializer::new(KeyStoreConfig::new("/ks.p12"), loader, observer.clone());
        let trust = initializer.initialize().unwrap();

        assert!(matches!(
            trust.certificate_info(),
            Err(EncodingError::MalformedCertificate { index: 0, .. })
        ));
        assert_eq!(
            observer.events(),
            vec!["loaded:1".to_string(), "encoding:TRUST0003E".to_string()]
        );
    }

    #[test]
    fn test_certificate_info_follows_chain_order() {
        let first = valid_certificate();
        let chain = CertificateChain::new(vec![first.clone(), valid_certificate()]);
        let mut loader = MockKeyStoreLoader::new();
        loader
            .expect_load()
            .returning(move |_| Ok(chain.clone()));

        let mut initializer = quiet_initializer(KeyStoreConfig::new("/ks.p12"), loader);
        let trust = initializer.initialize().unwrap();

        let info = trust.certificate_info().unwrap();
        assert_eq!(info.len(), 2);
        assert_eq!(info[0], first.info().unwrap());
    }

    #[test]
    fn test_trust_is_shareable_across_threads() {
        let chain = CertificateChain::new(vec![valid_certificate()]);
        let mut loader = MockKeyStoreLoader::new();
        loader
            .expect_load()
            .returning(move |_| Ok(chain.clone()));

        let mut initializer = quiet_initializer(KeyStoreConfig::new("/ks.p12"), loader);
        let trust = initializer.initialize().unwrap();
        let expected = trust.certificates_in_pem_format().unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let trust = trust.clone();
                std::thread::spawn(move || trust.certificates_in_pem_format().unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
