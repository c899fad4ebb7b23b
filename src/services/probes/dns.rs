// Hostname reachability via the system resolver

use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::lookup_host;

use super::{ProbeError, ReachabilityProbe};

pub struct DnsReachabilityProbe {
    timeout: Duration,
}

impl DnsReachabilityProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Reachable when `resolve` yields at least one address before the deadline
    async fn resolve_within<F, I>(&self, hostname: &str, resolve: F) -> Result<(), ProbeError>
    where
        F: Future<Output = io::Result<I>>,
        I: Iterator<Item = SocketAddr>,
    {
        match tokio::time::timeout(self.timeout, resolve).await {
            Ok(Ok(mut addrs)) => match addrs.next() {
                Some(_) => Ok(()),
                None => Err(ProbeError::Dns(format!("no addresses for {}", hostname))),
            },
            Ok(Err(e)) => Err(ProbeError::Dns(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl ReachabilityProbe for DnsReachabilityProbe {
    async fn lookup(&self, hostname: &str) -> Result<(), ProbeError> {
        // Port is required by lookup_host but never contacted
        self.resolve_within(hostname, lookup_host(format!("{}:80", hostname)))
            .await
    }
}
