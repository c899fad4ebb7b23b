// Services module for the ClickShield backend
// Business logic layer: verdict cache, network probes, check pipeline

pub mod probes;
pub mod url_check;
pub mod verdict_cache;

// Re-export commonly used services
pub use probes::{
    DnsReachabilityProbe, HttpRedirectResolver, ProbeError, ReachabilityProbe, RedirectOutcome,
    RedirectResolver, RustlsProbe, TlsProbe,
};
pub use url_check::UrlCheckService;
pub use verdict_cache::{normalize_cache_key, VerdictCache};
