// Centralized configuration management for the ClickShield backend
// Load ALL env vars ONCE at startup

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Global application configuration loaded once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    // For tests, load .env file first
    #[cfg(test)]
    dotenv::dotenv().ok();

    AppConfig::from_env().expect("Failed to load configuration")
});

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub safe_browsing: SafeBrowsingConfig,
    pub probes: ProbeConfig,
    pub cache: CacheConfig,
    pub cors_allowed_origins: Vec<String>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_host: String,
    pub port: u16,
    pub base_path: String,
    pub environment: Environment,
    pub rust_log: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Tracing filter from `RUST_LOG`, or `info` when the directives do not parse
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.rust_log).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Google Safe Browsing configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SafeBrowsingConfig {
    /// Missing key is reported per request (500), not at startup
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_url: String,
    pub client_id: String,
    pub client_version: String,
    pub timeout_ms: u64,
}

impl SafeBrowsingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Hand-written so the key never ends up in logs
impl std::fmt::Debug for SafeBrowsingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeBrowsingConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_version", &self.client_version)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Network probe configuration (redirects, DNS, TLS)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub redirect_timeout_ms: u64,
    pub max_redirects: usize,
    pub dns_timeout_ms: u64,
    pub tls_timeout_ms: u64,
}

impl ProbeConfig {
    pub fn redirect_timeout(&self) -> Duration {
        Duration::from_millis(self.redirect_timeout_ms)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    pub fn tls_timeout(&self) -> Duration {
        Duration::from_millis(self.tls_timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            redirect_timeout_ms: 7000,
            max_redirects: 5,
            dns_timeout_ms: 5000,
            tls_timeout_ms: 5000,
        }
    }
}

/// Verdict cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 300 }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Helper function to get optional env var with default
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default).trim().parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
            })
        };

        let port: u16 = get_or_default("PORT", "8001").trim().parse().map_err(|_| {
            ConfigError::InvalidValue("PORT".to_string(), "not a valid port".to_string())
        })?;

        let environment = Environment::from(get_or_default("ENVIRONMENT", "development"));

        let mut base_path = get_or_default("API_BASE_PATH", "/api").trim().to_string();
        if !base_path.is_empty() && !base_path.starts_with('/') {
            base_path.insert(0, '/');
        }
        let base_path = base_path.trim_end_matches('/').to_string();

        let server = ServerConfig {
            bind_host: get_or_default("BIND_HOST", "0.0.0.0"),
            port,
            base_path,
            environment,
            rust_log: get_or_default("RUST_LOG", "info"),
        };

        // Empty key is the same as no key
        let api_key = env::var("GOOGLE_SAFE_BROWSING_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let safe_browsing = SafeBrowsingConfig {
            api_key,
            api_url: get_or_default(
                "SAFE_BROWSING_API_URL",
                "https://safebrowsing.googleapis.com/v4/threatMatches:find",
            ),
            client_id: get_or_default("SAFE_BROWSING_CLIENT_ID", "clickshield"),
            client_version: get_or_default("SAFE_BROWSING_CLIENT_VERSION", "1.0.0"),
            timeout_ms: parse_u64_or_default("THREAT_LOOKUP_TIMEOUT_MS", "10000")?,
        };

        let max_redirects = parse_u64_or_default("MAX_REDIRECTS", "5")? as usize;

        let probes = ProbeConfig {
            redirect_timeout_ms: parse_u64_or_default("REDIRECT_TIMEOUT_MS", "7000")?,
            max_redirects,
            dns_timeout_ms: parse_u64_or_default("DNS_TIMEOUT_MS", "5000")?,
            tls_timeout_ms: parse_u64_or_default("TLS_TIMEOUT_MS", "5000")?,
        };

        let ttl_seconds = parse_u64_or_default("CACHE_TTL_SECONDS", "300")?;
        if ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "CACHE_TTL_SECONDS".to_string(),
                "TTL must be greater than zero".to_string(),
            ));
        }

        let cors_allowed_origins: Vec<String> = get_or_default("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            server,
            safe_browsing,
            probes,
            cache: CacheConfig { ttl_seconds },
            cors_allowed_origins,
        })
    }

    /// Whether the upstream API key is present
    pub fn has_api_key(&self) -> bool {
        self.safe_browsing.api_key.is_some()
    }
}

/// Get the global configuration instance
/// This is the primary way to access configuration throughout the app
pub fn config() -> &'static AppConfig {
    &CONFIG
}
