// Redirect resolution over reqwest's bounded redirect policy

use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ProbeError, RedirectOutcome, RedirectResolver};
use crate::app_config::ProbeConfig;

pub struct HttpRedirectResolver {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRedirectResolver {
    pub fn new(config: &ProbeConfig) -> Self {
        Self::with_limits(config.max_redirects, config.redirect_timeout())
    }

    pub fn with_limits(max_redirects: usize, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(max_redirects))
            .timeout(timeout)
            .user_agent("ClickShield-LinkChecker/1.0")
            .build()
            .unwrap_or_default();

        Self { client, timeout }
    }
}

#[async_trait]
impl RedirectResolver for HttpRedirectResolver {
    async fn resolve_final(&self, url: &str) -> Result<RedirectOutcome, ProbeError> {
        let requested = Url::parse(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;

        let response = self.client.get(requested.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(self.timeout.as_millis() as u64)
            } else {
                ProbeError::Http(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        // Compare parsed forms so "https://a.com" and "https://a.com/" are the same place
        let redirected = response.url() != &requested;
        let final_url = if redirected {
            response.url().to_string()
        } else {
            url.to_string()
        };

        debug!(
            "Resolved {} -> {} (HTTP {}, redirected: {})",
            url, final_url, status, redirected
        );

        Ok(RedirectOutcome {
            final_url,
            status,
            redirected,
        })
    }
}
