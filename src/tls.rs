//! TLS identity loading and validation.
//!
//! The certificate/key pair is provisioned externally (ops tooling, a
//! separate issuance pipeline) and consumed here exactly once per load: read
//! the PEM files, inspect the leaf certificate, refuse material whose
//! validity window is inverted or does not contain the current time, and
//! build the rustls server configuration the listener presents during
//! handshakes. A failed load at startup is fatal; a failed load during a
//! reload leaves the serving identity untouched.

use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;

use rustls::ServerConfig;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use time::OffsetDateTime;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

/// Subject metadata parsed from the leaf certificate.
///
/// Loaded once and read-only afterwards; safe to share across connection
/// tasks.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    /// Subject common name, if the certificate carries one
    pub common_name: Option<String>,
    /// Issuer distinguished name
    pub issuer: String,
    /// Start of the validity window
    pub not_before: OffsetDateTime,
    /// End of the validity window
    pub not_after: OffsetDateTime,
}

/// A validated certificate chain and private key, ready to terminate TLS.
pub struct TlsIdentity {
    /// Certificate chain (leaf first, then intermediates)
    cert_chain: Vec<CertificateDer<'static>>,

    /// Private key matching the leaf
    private_key: PrivateKeyDer<'static>,

    /// Parsed leaf metadata
    info: CertificateInfo,
}

impl std::fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsIdentity")
            .field("chain_length", &self.cert_chain.len())
            .field("info", &self.info)
            .finish()
    }
}

impl TlsIdentity {
    /// Load and validate the certificate/key pair from PEM files.
    ///
    /// Fails if either file is unreadable, holds no usable material, or the
    /// leaf certificate's validity window is inverted or excludes the
    /// current time. The key itself is only checked against the certificate
    /// when the server configuration is built.
    pub fn load(cert_path: &str, key_path: &str) -> Result<Self, TlsError> {
        let cert_chain = Self::load_cert_chain(cert_path)?;
        let private_key = Self::load_private_key(key_path)?;

        // Chain is non-empty here; the leaf comes first by PEM convention.
        let info = inspect_leaf(&cert_chain[0])?;
        check_validity_window(&info, OffsetDateTime::now_utc())?;

        tracing::debug!(
            common_name = ?info.common_name,
            issuer = %info.issuer,
            not_before = %info.not_before,
            not_after = %info.not_after,
            chain_length = cert_chain.len(),
            "Loaded TLS identity"
        );

        Ok(Self {
            cert_chain,
            private_key,
            info,
        })
    }

    fn load_cert_chain(path: &str) -> Result<Vec<CertificateDer<'static>>, TlsError> {
        let file = File::open(path).map_err(|e| TlsError::CertificateRead {
            path: path.to_string(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);

        let certs = rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TlsError::CertificateRead {
                path: path.to_string(),
                source: e,
            })?;

        if certs.is_empty() {
            return Err(TlsError::EmptyCertificateChain(path.to_string()));
        }

        Ok(certs)
    }

    fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>, TlsError> {
        let file = File::open(path).map_err(|e| TlsError::KeyRead {
            path: path.to_string(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);

        rustls_pemfile::private_key(&mut reader)
            .map_err(|e| TlsError::KeyRead {
                path: path.to_string(),
                source: e,
            })?
            .ok_or_else(|| TlsError::MissingPrivateKey(path.to_string()))
    }

    /// Parsed metadata of the leaf certificate.
    pub fn info(&self) -> &CertificateInfo {
        &self.info
    }

    /// The validated chain and key as raw DER bytes.
    ///
    /// Consumes the identity; copy the [`CertificateInfo`] out first if the
    /// metadata is still needed.
    pub fn into_der(self) -> (Vec<Vec<u8>>, Vec<u8>) {
        let cert_chain = self
            .cert_chain
            .iter()
            .map(|cert| cert.as_ref().to_vec())
            .collect();
        let key = self.private_key.secret_der().to_vec();
        (cert_chain, key)
    }

    /// Build the rustls server configuration presented to clients.
    ///
    /// This is where a certificate/key mismatch surfaces: rustls checks the
    /// pair when assembling the config.
    pub fn into_server_config(self) -> Result<Arc<ServerConfig>, TlsError> {
        let mut config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(self.cert_chain, self.private_key)
            .map_err(TlsError::KeyMismatch)?;

        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

        Ok(Arc::new(config))
    }
}

/// Parse subject, issuer, and validity window out of the leaf certificate.
fn inspect_leaf(leaf: &CertificateDer<'_>) -> Result<CertificateInfo, TlsError> {
    let (_, cert) = X509Certificate::from_der(leaf.as_ref())
        .map_err(|e| TlsError::CertificateParse(e.to_string()))?;

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);

    Ok(CertificateInfo {
        common_name,
        issuer: cert.issuer().to_string(),
        not_before: cert.validity().not_before.to_datetime(),
        not_after: cert.validity().not_after.to_datetime(),
    })
}

/// Refuse material that is not currently presentable.
fn check_validity_window(info: &CertificateInfo, now: OffsetDateTime) -> Result<(), TlsError> {
    if info.not_before >= info.not_after {
        return Err(TlsError::InvalidValidityWindow {
            not_before: info.not_before,
            not_after: info.not_after,
        });
    }

    if now < info.not_before {
        return Err(TlsError::NotYetValid(info.not_before));
    }

    if now > info.not_after {
        return Err(TlsError::Expired(info.not_after));
    }

    Ok(())
}

/// TLS material error. Every variant is fatal at startup; during a SIGHUP
/// reload they are logged and the previous identity stays in service.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Failed to read certificate file '{path}': {source}")]
    CertificateRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read private key file '{path}': {source}")]
    KeyRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("No certificates found in '{0}'")]
    EmptyCertificateChain(String),

    #[error("No private key found in '{0}'")]
    MissingPrivateKey(String),

    #[error("Failed to parse leaf certificate: {0}")]
    CertificateParse(String),

    #[error(
        "Certificate validity window is inverted: not-before {not_before} does not precede not-after {not_after}"
    )]
    InvalidValidityWindow {
        not_before: OffsetDateTime,
        not_after: OffsetDateTime,
    },

    #[error("Certificate is not valid until {0}")]
    NotYetValid(OffsetDateTime),

    #[error("Certificate expired at {0}")]
    Expired(OffsetDateTime),

    #[error("Certificate and private key do not form a usable pair: {0}")]
    KeyMismatch(rustls::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
    use std::sync::Once;
    use time::Duration;

    static INIT: Once = Once::new();

    /// Install the crypto provider once for tests that build a ServerConfig.
    fn init_crypto() {
        INIT.call_once(|| {
            let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        });
    }

    /// Generate a self-signed CN=localhost certificate with the given window
    /// and write the PEM pair into `dir`.
    fn write_identity(
        dir: &tempfile::TempDir,
        not_before: OffsetDateTime,
        not_after: OffsetDateTime,
    ) -> (String, String) {
        let mut params =
            CertificateParams::new(vec!["localhost".to_string()]).expect("certificate params");
        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(DnType::CommonName, "localhost");
        params.not_before = not_before;
        params.not_after = not_after;

        let key_pair = KeyPair::generate().expect("generate key pair");
        let cert = params.self_signed(&key_pair).expect("self-sign certificate");

        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        std::fs::write(&cert_path, cert.pem()).expect("write cert.pem");
        std::fs::write(&key_path, key_pair.serialize_pem()).expect("write key.pem");

        (
            cert_path.display().to_string(),
            key_path.display().to_string(),
        )
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    #[test]
    fn loads_valid_identity_and_builds_server_config() {
        init_crypto();
        let dir = tempfile::tempdir().expect("tempdir");
        let (cert_path, key_path) =
            write_identity(&dir, now() - Duration::days(1), now() + Duration::days(365));

        let identity = TlsIdentity::load(&cert_path, &key_path).expect("identity should load");
        assert_eq!(identity.info().common_name.as_deref(), Some("localhost"));
        assert!(identity.info().not_before < identity.info().not_after);

        identity
            .into_server_config()
            .expect("pair should produce a server config");
    }

    #[tokio::test]
    async fn der_material_rebuilds_a_serving_config() {
        init_crypto();
        let dir = tempfile::tempdir().expect("tempdir");
        let (cert_path, key_path) =
            write_identity(&dir, now() - Duration::days(1), now() + Duration::days(30));

        let identity = TlsIdentity::load(&cert_path, &key_path).expect("identity should load");
        let (cert_chain, key) = identity.into_der();
        assert_eq!(cert_chain.len(), 1);
        assert!(!key.is_empty());

        // Same construction path the live reload uses, fed only from the
        // in-memory material.
        axum_server::tls_rustls::RustlsConfig::from_der(cert_chain, key)
            .await
            .expect("validated DER should rebuild a serving config");
    }

    #[test]
    fn rejects_expired_certificate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (cert_path, key_path) =
            write_identity(&dir, now() - Duration::days(30), now() - Duration::days(1));

        let err = TlsIdentity::load(&cert_path, &key_path).expect_err("expired cert must fail");
        assert!(matches!(err, TlsError::Expired(_)), "got {err:?}");
    }

    #[test]
    fn rejects_not_yet_valid_certificate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (cert_path, key_path) =
            write_identity(&dir, now() + Duration::days(1), now() + Duration::days(30));

        let err = TlsIdentity::load(&cert_path, &key_path).expect_err("future cert must fail");
        assert!(matches!(err, TlsError::NotYetValid(_)), "got {err:?}");
    }

    #[test]
    fn rejects_inverted_validity_window() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (cert_path, key_path) =
            write_identity(&dir, now() + Duration::days(1), now() - Duration::days(1));

        let err = TlsIdentity::load(&cert_path, &key_path).expect_err("inverted window must fail");
        assert!(
            matches!(err, TlsError::InvalidValidityWindow { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_missing_certificate_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bogus = dir.path().join("nope.pem").display().to_string();

        let err = TlsIdentity::load(&bogus, &bogus).expect_err("missing file must fail");
        assert!(matches!(err, TlsError::CertificateRead { .. }), "got {err:?}");
    }

    #[test]
    fn rejects_pem_without_certificates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        std::fs::write(&cert_path, "this is not pem material\n").expect("write junk");
        std::fs::write(&key_path, "neither is this\n").expect("write junk");

        let err = TlsIdentity::load(
            &cert_path.display().to_string(),
            &key_path.display().to_string(),
        )
        .expect_err("junk material must fail");
        assert!(
            matches!(err, TlsError::EmptyCertificateChain(_)),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_mismatched_certificate_and_key() {
        init_crypto();
        let dir_a = tempfile::tempdir().expect("tempdir");
        let dir_b = tempfile::tempdir().expect("tempdir");
        let (cert_a, _) =
            write_identity(&dir_a, now() - Duration::days(1), now() + Duration::days(30));
        let (_, key_b) =
            write_identity(&dir_b, now() - Duration::days(1), now() + Duration::days(30));

        let identity =
            TlsIdentity::load(&cert_a, &key_b).expect("load succeeds, pairing is checked later");
        let err = identity
            .into_server_config()
            .expect_err("mismatched pair must be rejected");
        assert!(matches!(err, TlsError::KeyMismatch(_)), "got {err:?}");
    }
}
