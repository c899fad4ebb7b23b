// URL safety verdict returned by /check-url and stored in the verdict cache

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::safe_browsing::{ThreatMatch, ANY_PLATFORM};

// =============================================================================
// THREAT CLASSIFICATION
// =============================================================================

/// Threat category of a verdict.
///
/// Upstream categories the service does not know are carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreatType {
    None,
    UnreachableDomain,
    ResourceStatus,
    Malware,
    SocialEngineering,
    UnwantedSoftware,
    PotentiallyHarmfulApplication,
    Other(String),
}

impl ThreatType {
    pub fn as_str(&self) -> &str {
        match self {
            ThreatType::None => "NONE",
            ThreatType::UnreachableDomain => "UNREACHABLE_DOMAIN",
            ThreatType::ResourceStatus => "RESOURCE_STATUS",
            ThreatType::Malware => "MALWARE",
            ThreatType::SocialEngineering => "SOCIAL_ENGINEERING",
            ThreatType::UnwantedSoftware => "UNWANTED_SOFTWARE",
            ThreatType::PotentiallyHarmfulApplication => "POTENTIALLY_HARMFUL_APPLICATION",
            ThreatType::Other(raw) => raw,
        }
    }

    /// Fixed user-facing description for upstream threat categories
    pub fn description(&self) -> &'static str {
        match self {
            ThreatType::Malware => {
                "This site contains malicious software that could harm your device"
            },
            ThreatType::SocialEngineering => {
                "This site is identified as a phishing attempt or social engineering attack"
            },
            ThreatType::UnwantedSoftware => {
                "This site may install unwanted software or browser extensions"
            },
            ThreatType::PotentiallyHarmfulApplication => {
                "This site hosts potentially harmful applications"
            },
            _ => "Unknown threat detected",
        }
    }
}

impl From<String> for ThreatType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "NONE" => ThreatType::None,
            "UNREACHABLE_DOMAIN" => ThreatType::UnreachableDomain,
            "RESOURCE_STATUS" => ThreatType::ResourceStatus,
            "MALWARE" => ThreatType::Malware,
            "SOCIAL_ENGINEERING" => ThreatType::SocialEngineering,
            "UNWANTED_SOFTWARE" => ThreatType::UnwantedSoftware,
            "POTENTIALLY_HARMFUL_APPLICATION" => ThreatType::PotentiallyHarmfulApplication,
            _ => ThreatType::Other(s),
        }
    }
}

impl From<ThreatType> for String {
    fn from(t: ThreatType) -> Self {
        match t {
            ThreatType::Other(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
}

// =============================================================================
// VERDICT
// =============================================================================

pub const UNREACHABLE_DESCRIPTION: &str =
    "Domain is unreachable or does not exist. Treat as suspicious.";
pub const UNREACHABLE_RECOMMENDATION: &str =
    "Do not trust this website. The domain does not resolve.";
pub const THREAT_RECOMMENDATION: &str =
    "Do not visit this website. It has been flagged as dangerous.";
pub const NO_THREAT_DESCRIPTION: &str = "No known threats detected";
pub const NO_THREAT_RECOMMENDATION: &str =
    "This website appears safe, but always exercise caution online.";
pub const RESOURCE_STATUS_RECOMMENDATION: &str = "Verify the URL path or try the site homepage.";

/// Safety verdict for one evaluated URL.
///
/// `warning` is a severity flag layered on top of `safe`, never a third state:
/// unreachable domains are `safe=false, warning=true`, broken pages on clean
/// sites are `safe=true, warning=true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub url: String,
    pub safe: bool,
    pub threat_type: ThreatType,
    pub platform_type: String,
    pub threat_description: String,
    pub confidence: Confidence,
    pub matches: Vec<ThreatMatch>,
    pub checked_variations: usize,
    pub ssl_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<bool>,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<u64>,
}

impl Verdict {
    /// DNS did not resolve: reported as suspicious, not as an error
    pub fn unreachable(url: &str, checked_variations: usize) -> Self {
        Self {
            url: url.to_string(),
            safe: false,
            threat_type: ThreatType::UnreachableDomain,
            platform_type: ANY_PLATFORM.to_string(),
            threat_description: UNREACHABLE_DESCRIPTION.to_string(),
            confidence: Confidence::Medium,
            matches: Vec::new(),
            checked_variations,
            ssl_verified: false,
            http_status: None,
            recommendation: UNREACHABLE_RECOMMENDATION.to_string(),
            warning: Some(true),
            cached: false,
            cache_age: None,
        }
    }

    /// Upstream reported at least one match. The first match decides the category.
    pub fn threat(
        url: &str,
        matches: Vec<ThreatMatch>,
        checked_variations: usize,
        ssl_verified: bool,
        http_status: Option<u16>,
    ) -> Self {
        let first = matches.first();
        let threat_type = first
            .and_then(|m| m.threat_type.clone())
            .map(ThreatType::from)
            .unwrap_or_else(|| ThreatType::Other("THREAT_TYPE_UNSPECIFIED".to_string()));
        let platform_type = first
            .and_then(|m| m.platform_type.clone())
            .unwrap_or_else(|| ANY_PLATFORM.to_string());

        Self {
            url: url.to_string(),
            safe: false,
            threat_description: threat_type.description().to_string(),
            threat_type,
            platform_type,
            confidence: Confidence::High,
            matches,
            checked_variations,
            ssl_verified,
            http_status,
            recommendation: THREAT_RECOMMENDATION.to_string(),
            warning: None,
            cached: false,
            cache_age: None,
        }
    }

    /// No upstream match. A final status >= 400 adds a resource warning without
    /// downgrading safety.
    pub fn no_threat(
        url: &str,
        checked_variations: usize,
        ssl_verified: bool,
        http_status: Option<u16>,
    ) -> Self {
        let mut verdict = Self {
            url: url.to_string(),
            safe: true,
            threat_type: ThreatType::None,
            platform_type: ANY_PLATFORM.to_string(),
            threat_description: NO_THREAT_DESCRIPTION.to_string(),
            confidence: Confidence::High,
            matches: Vec::new(),
            checked_variations,
            ssl_verified,
            http_status,
            recommendation: NO_THREAT_RECOMMENDATION.to_string(),
            warning: None,
            cached: false,
            cache_age: None,
        };

        if let Some(status) = http_status.filter(|s| *s >= 400) {
            verdict.warning = Some(true);
            verdict.threat_type = ThreatType::ResourceStatus;
            verdict.threat_description = format!(
                "Page returned HTTP {}. No known threats detected but the specific page does not exist or is inaccessible.",
                status
            );
            verdict.recommendation = RESOURCE_STATUS_RECOMMENDATION.to_string();
        }

        verdict
    }

    /// Copy annotated for a cache hit; the stored verdict is left untouched
    pub fn served_from_cache(&self, age: Duration) -> Self {
        Self {
            cached: true,
            cache_age: Some(round_secs(age)),
            ..self.clone()
        }
    }

    pub fn is_warning(&self) -> bool {
        self.warning.unwrap_or(false)
    }
}

fn round_secs(age: Duration) -> u64 {
    (age.as_millis() as f64 / 1000.0).round() as u64
}

/// Verdict read back from the cache together with its age
#[derive(Debug, Clone, PartialEq)]
pub struct CachedVerdict {
    pub verdict: Verdict,
    pub age: Duration,
}

impl CachedVerdict {
    pub fn into_response_verdict(self) -> Verdict {
        self.verdict.served_from_cache(self.age)
    }
}
