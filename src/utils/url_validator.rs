// Input validation and protocol-variant expansion for /check-url

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

// =============================================================================
// STATIC REGEX PATTERNS
// =============================================================================

lazy_static! {
    /// A single hostname label: letters, digits and hyphens only
    static ref LABEL_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9-]+$").expect("Invalid label pattern regex");

    /// Alphabetic top-level label, at least two characters
    static ref TLD_PATTERN: Regex =
        Regex::new(r"^[A-Za-z]{2,}$").expect("Invalid TLD pattern regex");

    /// Punycode top-level label (IDN TLDs)
    static ref PUNYCODE_TLD_PATTERN: Regex =
        Regex::new(r"^xn--[A-Za-z0-9-]+$").expect("Invalid punycode TLD pattern regex");
}

/// Characters never accepted in submitted URLs, besides whitespace and control characters
const FORBIDDEN_CHARS: &[char] = &['"', '\'', '<', '>', '`', '{', '}', '|', '\\', '^'];

const MIN_HOSTNAME_LEN: usize = 4;
const MAX_LABEL_LEN: usize = 63;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("URL is missing or not a string")]
    MissingInput,

    #[error("URL is empty or contains disallowed characters")]
    DisallowedCharacters,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Malformed hostname: {0}")]
    MalformedHostname(String),

    #[error("No valid URL variant could be built")]
    NoValidVariant,
}

// =============================================================================
// VALIDATOR
// =============================================================================

pub struct UrlValidator;

impl UrlValidator {
    /// Clean up raw user input.
    ///
    /// Surrounding whitespace is trimmed, then runs of leading/trailing quote
    /// characters left over from copy-paste are stripped. Whatever remains must
    /// be non-empty and free of whitespace, control characters and the
    /// injection-prone characters in `FORBIDDEN_CHARS`.
    pub fn validate_input(raw: &str) -> Result<String, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::MissingInput);
        }

        let cleaned = raw.trim().trim_matches(|c| c == '"' || c == '\'');

        if cleaned.is_empty() || cleaned.chars().any(is_disallowed_char) {
            return Err(ValidationError::DisallowedCharacters);
        }

        Ok(cleaned.to_string())
    }

    /// Parse a candidate URL and apply the hostname syntax rule
    pub fn validate_variant(candidate: &str) -> Result<Url, ValidationError> {
        let parsed =
            Url::parse(candidate).map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;

        let host = parsed.host_str().unwrap_or_default();
        if !is_hostname_valid(host) {
            return Err(ValidationError::MalformedHostname(host.to_string()));
        }

        Ok(parsed)
    }
}

fn is_disallowed_char(c: char) -> bool {
    c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(&c)
}

/// Hostname syntax rule: dotted name of 1-63 char alphanumeric/hyphen labels,
/// no empty labels, no edge hyphens, alphabetic or punycode TLD.
pub fn is_hostname_valid(hostname: &str) -> bool {
    if hostname.len() < MIN_HOSTNAME_LEN || !hostname.contains('.') {
        return false;
    }
    if hostname.contains("..") || hostname.starts_with('.') || hostname.ends_with('.') {
        return false;
    }

    let labels: Vec<&str> = hostname.split('.').collect();
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && LABEL_PATTERN.is_match(label)
            && !label.starts_with('-')
            && !label.ends_with('-')
    });
    if !labels_ok {
        return false;
    }

    match labels.last() {
        Some(tld) => TLD_PATTERN.is_match(tld) || PUNYCODE_TLD_PATTERN.is_match(tld),
        None => false,
    }
}

// =============================================================================
// VARIANT EXPANSION
// =============================================================================

/// Build the ordered list of URLs to evaluate.
///
/// Input that already carries a scheme is its own single variant; a bare
/// domain becomes `https://` then `http://`. Variants failing
/// `UrlValidator::validate_variant` are dropped.
pub fn expand_variants(validated: &str) -> Result<Vec<String>, ValidationError> {
    let candidates = if validated.contains("://") {
        vec![validated.to_string()]
    } else {
        vec![format!("https://{}", validated), format!("http://{}", validated)]
    };

    let single = candidates.len() == 1;
    let mut last_error = ValidationError::NoValidVariant;

    let variants: Vec<String> = candidates
        .into_iter()
        .filter(|candidate| match UrlValidator::validate_variant(candidate) {
            Ok(_) => true,
            Err(e) => {
                debug!("Dropping URL variant {}: {}", candidate, e);
                last_error = e;
                false
            },
        })
        .collect();

    if variants.is_empty() {
        // A schemed input keeps its specific reason; bare domains report the aggregate
        return Err(if single {
            last_error
        } else {
            ValidationError::NoValidVariant
        });
    }

    Ok(variants)
}
