// Google Safe Browsing v4 client (threatMatches:find)

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::app_config::SafeBrowsingConfig;
use crate::models::safe_browsing::{FindThreatMatchesRequest, FindThreatMatchesResponse, ThreatMatch};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Lookup failures, split by how far they reach.
///
/// `QuotaExceeded` and `UpstreamUnavailable` end the whole request; `Skip`
/// only abandons the URL being looked up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ThreatLookupError {
    #[error("Safe Browsing API key not configured")]
    NotConfigured,

    #[error("Safe Browsing quota exceeded")]
    QuotaExceeded,

    #[error("Safe Browsing unavailable (HTTP {0})")]
    UpstreamUnavailable(u16),

    #[error("Safe Browsing lookup failed: {0}")]
    Skip(String),
}

// =============================================================================
// LOOKUP TRAIT
// =============================================================================

#[async_trait]
pub trait ThreatLookup: Send + Sync {
    /// Whether credentials are present; checked before any network activity
    fn is_configured(&self) -> bool;

    /// Matches for a single URL; empty when the URL is on no list
    async fn find_threats(&self, url: &str) -> Result<Vec<ThreatMatch>, ThreatLookupError>;
}

// =============================================================================
// SAFE BROWSING CLIENT
// =============================================================================

pub struct SafeBrowsingClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    client_id: String,
    client_version: String,
}

impl SafeBrowsingClient {
    pub fn new(config: &SafeBrowsingConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("{}/{}", config.client_id, config.client_version))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            client_id: config.client_id.clone(),
            client_version: config.client_version.clone(),
        }
    }
}

#[async_trait]
impl ThreatLookup for SafeBrowsingClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self))]
    async fn find_threats(&self, url: &str) -> Result<Vec<ThreatMatch>, ThreatLookupError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ThreatLookupError::NotConfigured)?;

        let body = FindThreatMatchesRequest::for_url(&self.client_id, &self.client_version, url);

        // Request errors carry the URL, which includes the key; strip it before logging
        let response = self
            .http_client
            .post(&self.api_url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| ThreatLookupError::Skip(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Safe Browsing quota exceeded");
            return Err(ThreatLookupError::QuotaExceeded);
        }
        if status.is_server_error() {
            warn!("Safe Browsing returned HTTP {}", status.as_u16());
            return Err(ThreatLookupError::UpstreamUnavailable(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ThreatLookupError::Skip(format!(
                "unexpected HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: FindThreatMatchesResponse = response
            .json()
            .await
            .map_err(|e| ThreatLookupError::Skip(e.without_url().to_string()))?;

        debug!("Safe Browsing returned {} match(es)", parsed.matches.len());
        Ok(parsed.matches)
    }
}
