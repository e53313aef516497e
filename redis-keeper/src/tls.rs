//! TLS client setup
//!
//! Builds a rustls connector from [`TlsConfig`]: a PEM CA bundle when one is
//! configured, otherwise the webpki root set. A pool resolves its
//! [`TlsContext`] once and reuses it for every dial.

use redis_keeper_core::{
    config::TlsConfig,
    error::{RedisError, RedisResult},
};
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::RootCertStore;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

/// Build a connector for `config`
pub fn build_connector(config: &TlsConfig) -> RedisResult<TlsConnector> {
    let mut root_store = RootCertStore::empty();

    if let Some(ref ca_path) = config.ca_path {
        let ca_file = File::open(ca_path)
            .map_err(|e| RedisError::Tls(format!("{}: {}", ca_path.display(), e)))?;
        let mut ca_reader = BufReader::new(ca_file);
        let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut ca_reader)
            .collect::<Result<_, _>>()
            .map_err(|e| RedisError::Tls(format!("{}: {}", ca_path.display(), e)))?;

        if certs.is_empty() {
            return Err(RedisError::Tls(format!(
                "{}: no certificates found",
                ca_path.display()
            )));
        }

        for cert in certs {
            root_store
                .add(cert)
                .map_err(|e| RedisError::Tls(format!("Failed to add CA: {}", e)))?;
        }
    } else {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    let client_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(client_config)))
}

/// A connector and server name resolved once and shared by every dial
#[derive(Clone)]
pub struct TlsContext {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}

impl TlsContext {
    /// Load the trust store and resolve the SNI name, falling back to `host`
    pub fn new(config: &TlsConfig, host: &str) -> RedisResult<Self> {
        let connector = build_connector(config)?;
        let name = config.server_name.as_deref().unwrap_or(host);
        let server_name = ServerName::try_from(name.to_string())
            .map_err(|e| RedisError::Tls(format!("Invalid server name '{}': {}", name, e)))?;

        Ok(Self {
            connector,
            server_name,
        })
    }

    /// Run the TLS handshake over an established TCP stream
    pub async fn handshake(&self, stream: TcpStream) -> RedisResult<TlsStream<TcpStream>> {
        self.connector
            .connect(self.server_name.clone(), stream)
            .await
            .map_err(|e| {
                RedisError::Connect(format!(
                    "TLS handshake with {:?} failed: {}",
                    self.server_name, e
                ))
            })
    }
}
