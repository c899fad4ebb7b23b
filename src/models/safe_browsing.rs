// Google Safe Browsing v4 wire types (threatMatches:find)

use serde::{Deserialize, Serialize};

/// Threat types submitted with every lookup
pub const THREAT_TYPES: [&str; 4] = [
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

pub const ANY_PLATFORM: &str = "ANY_PLATFORM";
pub const URL_ENTRY_TYPE: &str = "URL";

// =============================================================================
// REQUEST
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_id: String,
    pub client_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatEntry {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreatInfo {
    pub threat_types: Vec<String>,
    pub platform_types: Vec<String>,
    pub threat_entry_types: Vec<String>,
    pub threat_entries: Vec<ThreatEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FindThreatMatchesRequest {
    pub client: ClientInfo,
    pub threat_info: ThreatInfo,
}

impl FindThreatMatchesRequest {
    /// One request per URL, always the full set of threat types on any platform
    pub fn for_url(client_id: &str, client_version: &str, url: &str) -> Self {
        Self {
            client: ClientInfo {
                client_id: client_id.to_string(),
                client_version: client_version.to_string(),
            },
            threat_info: ThreatInfo {
                threat_types: THREAT_TYPES.iter().map(|t| t.to_string()).collect(),
                platform_types: vec![ANY_PLATFORM.to_string()],
                threat_entry_types: vec![URL_ENTRY_TYPE.to_string()],
                threat_entries: vec![ThreatEntry {
                    url: url.to_string(),
                }],
            },
        }
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// A single upstream match. Unknown fields are kept so the record passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat: Option<ThreatEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_entry_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `matches` is absent (or empty) when the URL is not on any list
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FindThreatMatchesResponse {
    #[serde(default)]
    pub matches: Vec<ThreatMatch>,
}
