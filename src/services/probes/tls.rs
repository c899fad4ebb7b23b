// TLS certificate check: strict handshake against the webpki root store,
// then a HEAD request over the secured stream

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::debug;
use url::Url;

use super::{ProbeError, TlsProbe};

const HEADER_END: &[u8] = b"\r\n\r\n";
const MAX_HEADER_BYTES: usize = 64 * 1024;

pub struct RustlsProbe {
    connector: TlsConnector,
    timeout: Duration,
}

impl RustlsProbe {
    pub fn new(timeout: Duration) -> Self {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        Self::with_root_store(root_store, timeout)
    }

    /// Probe trusting only the given roots
    pub fn with_root_store(root_store: RootCertStore, timeout: Duration) -> Self {
        let config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        }
    }

    async fn handshake_and_head(&self, host: &str, port: u16) -> Result<(), ProbeError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;

        let sock = TcpStream::connect((host, port))
            .await
            .map_err(|e| ProbeError::Connect(format!("{}:{} - {}", host, port, e)))?;

        let mut tls_stream = self
            .connector
            .connect(server_name, sock)
            .await
            .map_err(|e| ProbeError::Tls(e.to_string()))?;

        let request = format!(
            "HEAD / HTTP/1.1\r\nHost: {}\r\nUser-Agent: ClickShield-LinkChecker/1.0\r\nConnection: close\r\n\r\n",
            host
        );
        tls_stream
            .write_all(request.as_bytes())
            .await
            .map_err(|e| ProbeError::Http(e.to_string()))?;

        // A HEAD response is complete once the header block ends
        let mut received = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = tls_stream
                .read(&mut chunk)
                .await
                .map_err(|e| ProbeError::Http(e.to_string()))?;
            if n == 0 {
                return Err(ProbeError::Http(
                    "connection closed before response completed".to_string(),
                ));
            }
            received.extend_from_slice(&chunk[..n]);

            if received.windows(HEADER_END.len()).any(|w| w == HEADER_END) {
                break;
            }
            if received.len() > MAX_HEADER_BYTES {
                return Err(ProbeError::Http("response headers too large".to_string()));
            }
        }

        if !received.starts_with(b"HTTP/") {
            return Err(ProbeError::Http("not an HTTP response".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl TlsProbe for RustlsProbe {
    async fn verify(&self, url: &str) -> Result<(), ProbeError> {
        let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
        if parsed.scheme() != "https" {
            return Err(ProbeError::NotHttps);
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ProbeError::InvalidUrl("missing host".to_string()))?;
        let port = parsed.port_or_known_default().unwrap_or(443);

        // Dropping the timed-out future closes the socket
        let result = tokio::time::timeout(self.timeout, self.handshake_and_head(host, port))
            .await
            .unwrap_or_else(|_| Err(ProbeError::Timeout(self.timeout.as_millis() as u64)));

        if let Err(ref e) = result {
            debug!("TLS check failed for {}: {}", url, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_http_is_not_checked() {
        let probe = RustlsProbe::new(Duration::from_secs(5));
        assert_eq!(
            probe.verify("http://example.com").await,
            Err(ProbeError::NotHttps)
        );
    }

    #[tokio::test]
    async fn test_unparseable_url() {
        let probe = RustlsProbe::new(Duration::from_secs(5));
        assert!(matches!(
            probe.verify("not a url").await,
            Err(ProbeError::InvalidUrl(_))
        ));
    }
}
