// Network probes used while evaluating a URL: redirects, DNS, TLS
//
// Every probe reports failure as a `ProbeError` value; the orchestrator decides
// what a failure means for the verdict.

pub mod dns;
pub mod redirect;
pub mod tls;

use async_trait::async_trait;
use thiserror::Error;

pub use dns::DnsReachabilityProbe;
pub use redirect::HttpRedirectResolver;
pub use tls::RustlsProbe;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Not an https URL")]
    NotHttps,

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("HTTP request failed: {0}")]
    Http(String),
}

// =============================================================================
// PROBE TRAITS
// =============================================================================

/// Where a URL ends up after following redirects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectOutcome {
    pub final_url: String,
    pub status: u16,
    pub redirected: bool,
}

#[async_trait]
pub trait RedirectResolver: Send + Sync {
    /// Follow redirects from `url`. Any HTTP status is a successful outcome;
    /// only transport failures are errors.
    async fn resolve_final(&self, url: &str) -> Result<RedirectOutcome, ProbeError>;
}

#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Ok when the hostname resolves to at least one address
    async fn lookup(&self, hostname: &str) -> Result<(), ProbeError>;
}

#[async_trait]
pub trait TlsProbe: Send + Sync {
    /// Ok when an https URL's host presents a browser-trusted certificate and
    /// answers a HEAD request over the secured connection
    async fn verify(&self, url: &str) -> Result<(), ProbeError>;
}
