// URL safety check pipeline
// validate -> expand -> cache (unsafe first, then safe) -> per-variant live evaluation

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::app_config::AppConfig;
use crate::models::verdict::Verdict;
use crate::services::probes::{
    DnsReachabilityProbe, HttpRedirectResolver, ReachabilityProbe, RedirectOutcome,
    RedirectResolver, RustlsProbe, TlsProbe,
};
use crate::services::verdict_cache::VerdictCache;
use crate::utils::check_errors::{CheckError, CheckResult};
use crate::utils::safe_browsing_client::{SafeBrowsingClient, ThreatLookup, ThreatLookupError};
use crate::utils::url_validator::{expand_variants, UrlValidator};

pub struct UrlCheckService {
    cache: Arc<VerdictCache>,
    redirects: Arc<dyn RedirectResolver>,
    reachability: Arc<dyn ReachabilityProbe>,
    tls: Arc<dyn TlsProbe>,
    threats: Arc<dyn ThreatLookup>,
}

/// Redirect and TLS facts for one variant, shared by every URL evaluated for it
struct VariantContext {
    final_status: Option<u16>,
    ssl_verified: bool,
}

impl UrlCheckService {
    pub fn new(
        cache: Arc<VerdictCache>,
        redirects: Arc<dyn RedirectResolver>,
        reachability: Arc<dyn ReachabilityProbe>,
        tls: Arc<dyn TlsProbe>,
        threats: Arc<dyn ThreatLookup>,
    ) -> Self {
        Self {
            cache,
            redirects,
            reachability,
            tls,
            threats,
        }
    }

    /// Production wiring: reqwest redirects, system DNS, rustls, Safe Browsing
    pub fn from_config(config: &AppConfig, cache: Arc<VerdictCache>) -> Self {
        Self::new(
            cache,
            Arc::new(HttpRedirectResolver::new(&config.probes)),
            Arc::new(DnsReachabilityProbe::new(config.probes.dns_timeout())),
            Arc::new(RustlsProbe::new(config.probes.tls_timeout())),
            Arc::new(SafeBrowsingClient::new(&config.safe_browsing)),
        )
    }

    pub fn cache(&self) -> &Arc<VerdictCache> {
        &self.cache
    }

    pub fn threat_lookup_configured(&self) -> bool {
        self.threats.is_configured()
    }

    /// Run the full check for raw user input.
    ///
    /// The first decisive result wins: an unsafe cached verdict, then a safe
    /// cached one, then the first live verdict (unreachable, threat or clean).
    /// Later variants are never evaluated once one of these is returned.
    #[instrument(skip(self))]
    pub async fn check(&self, raw: &str) -> CheckResult<Verdict> {
        let input = UrlValidator::validate_input(raw)?;
        let variants = expand_variants(&input)?;

        if !self.threats.is_configured() {
            error!("Google Safe Browsing API key is not configured");
            return Err(CheckError::MissingApiKey);
        }

        if let Some(verdict) = self.cached_verdict(&variants).await {
            return Ok(verdict);
        }

        let mut checked: HashSet<String> = HashSet::new();

        for variant in &variants {
            let outcome = self.resolve_redirects(variant).await;
            let context = VariantContext {
                final_status: outcome.as_ref().map(|o| o.status),
                ssl_verified: self.tls_verified(outcome.as_ref(), variant).await,
            };

            let mut urls_to_check = vec![variant.clone()];
            if let Some(o) = outcome.as_ref().filter(|o| o.redirected) {
                urls_to_check.push(o.final_url.clone());
            }

            for url in &urls_to_check {
                if let Some(verdict) = self.evaluate_url(url, &context, &mut checked).await? {
                    return Ok(verdict);
                }
            }
        }

        error!("No decisive result for {:?}, falling back to cache", variants);
        match self.cache.get(&variants[0]).await {
            Some(hit) => Ok(hit.verdict),
            None => Err(CheckError::Exhausted),
        }
    }

    /// Unsafe cached verdicts across all variants outrank any safe one
    async fn cached_verdict(&self, variants: &[String]) -> Option<Verdict> {
        for want_safe in [false, true] {
            for variant in variants {
                if let Some(hit) = self.cache.get(variant).await {
                    if hit.verdict.safe == want_safe {
                        info!(
                            "Cache hit for {} (safe: {}, age: {:?})",
                            variant, want_safe, hit.age
                        );
                        return Some(hit.into_response_verdict());
                    }
                }
            }
        }
        None
    }

    async fn resolve_redirects(&self, variant: &str) -> Option<RedirectOutcome> {
        match self.redirects.resolve_final(variant).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                debug!("Redirect resolution failed for {}: {}", variant, e);
                None
            },
        }
    }

    /// TLS is checked on the post-redirect URL, and only when it is https
    async fn tls_verified(&self, outcome: Option<&RedirectOutcome>, variant: &str) -> bool {
        let final_url = outcome.map(|o| o.final_url.as_str()).unwrap_or(variant);

        let is_https = Url::parse(final_url)
            .map(|u| u.scheme() == "https")
            .unwrap_or(false);
        if !is_https {
            return false;
        }

        self.tls.verify(final_url).await.is_ok()
    }

    /// Ok(Some) ends the request with a verdict, Ok(None) moves on to the next URL
    async fn evaluate_url(
        &self,
        url: &str,
        context: &VariantContext,
        checked: &mut HashSet<String>,
    ) -> CheckResult<Option<Verdict>> {
        checked.insert(url.to_string());

        let hostname = match Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        {
            Some(host) => host,
            None => {
                warn!("Skipping unparseable URL {}", url);
                return Ok(None);
            },
        };

        if let Err(e) = self.reachability.lookup(&hostname).await {
            info!("Domain {} is unreachable: {}", hostname, e);
            let verdict = Verdict::unreachable(url, checked.len());
            self.cache.put(url, verdict.clone()).await;
            return Ok(Some(verdict));
        }

        let matches = match self.threats.find_threats(url).await {
            Ok(matches) => matches,
            Err(ThreatLookupError::QuotaExceeded) => return Err(CheckError::QuotaExceeded),
            Err(ThreatLookupError::UpstreamUnavailable(_)) => {
                return Err(CheckError::UpstreamUnavailable)
            },
            Err(ThreatLookupError::NotConfigured) => return Err(CheckError::MissingApiKey),
            Err(ThreatLookupError::Skip(reason)) => {
                warn!("Threat lookup skipped for {}: {}", url, reason);
                return Ok(None);
            },
        };

        let verdict = if matches.is_empty() {
            Verdict::no_threat(
                url,
                checked.len(),
                context.ssl_verified,
                context.final_status,
            )
        } else {
            Verdict::threat(
                url,
                matches,
                checked.len(),
                context.ssl_verified,
                context.final_status,
            )
        };

        info!(
            "Verdict for {}: safe={} threat_type={}",
            url, verdict.safe, verdict.threat_type
        );
        self.cache.put(url, verdict.clone()).await;
        Ok(Some(verdict))
    }
}
