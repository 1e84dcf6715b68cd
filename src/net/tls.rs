//! TLS configuration and certificate loading.

use axum_server::tls_rustls::RustlsConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for TLS material loading.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificate found in {0}")]
    NoCertificate(String),

    #[error("no private key found in {0}")]
    NoPrivateKey(String),

    #[error("malformed PEM in {origin}: {source}")]
    Malformed {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rejected TLS material: {0}")]
    Rejected(#[source] std::io::Error),
}

/// Install the process-wide rustls crypto provider. Safe to call repeatedly.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let cert = read(cert_path).await?;
    let key = read(key_path).await?;

    check_pem(&cert, &key, &cert_path.display().to_string(), &key_path.display().to_string())?;
    build(cert, key).await
}

/// Build TLS configuration from in-memory PEM material.
pub async fn tls_config_from_pem(cert: Vec<u8>, key: Vec<u8>) -> Result<RustlsConfig, TlsError> {
    check_pem(&cert, &key, "certificate PEM", "key PEM")?;
    build(cert, key).await
}

async fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

async fn build(cert: Vec<u8>, key: Vec<u8>) -> Result<RustlsConfig, TlsError> {
    install_crypto_provider();
    RustlsConfig::from_pem(cert, key)
        .await
        .map_err(TlsError::Rejected)
}

/// Check that the PEM blobs hold at least one certificate and a private key.
fn check_pem(cert: &[u8], key: &[u8], cert_origin: &str, key_origin: &str) -> Result<(), TlsError> {
    let mut certs = 0;
    for entry in rustls_pemfile::certs(&mut &cert[..]) {
        entry.map_err(|source| TlsError::Malformed {
            origin: cert_origin.to_string(),
            source,
        })?;
        certs += 1;
    }
    if certs == 0 {
        return Err(TlsError::NoCertificate(cert_origin.to_string()));
    }

    match rustls_pemfile::private_key(&mut &key[..]) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(TlsError::NoPrivateKey(key_origin.to_string())),
        Err(source) => Err(TlsError::Malformed {
            origin: key_origin.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_signed() -> (Vec<u8>, Vec<u8>) {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        (
            certified.cert.pem().into_bytes(),
            certified.key_pair.serialize_pem().into_bytes(),
        )
    }

    #[tokio::test]
    async fn test_loads_generated_material() {
        let (cert, key) = self_signed();
        assert!(tls_config_from_pem(cert, key).await.is_ok());
    }

    #[tokio::test]
    async fn test_key_in_place_of_cert_is_rejected() {
        let (_, key) = self_signed();
        let err = tls_config_from_pem(key.clone(), key).await.unwrap_err();
        assert!(matches!(err, TlsError::NoCertificate(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let (cert, _) = self_signed();
        let err = tls_config_from_pem(cert.clone(), cert).await.unwrap_err();
        assert!(matches!(err, TlsError::NoPrivateKey(_)));
    }

    #[tokio::test]
    async fn test_missing_file_names_path() {
        let err = load_tls_config(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cert.pem"));
    }
}
