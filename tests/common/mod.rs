// Common test utilities and helper structs
// Shared across all test files to avoid duplication
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, Response, StatusCode},
    Router,
};
use clickshield_backend::{
    app::AppState,
    app_config::{
        AppConfig, CacheConfig, Environment, ProbeConfig, SafeBrowsingConfig, ServerConfig,
    },
    build_router,
    models::{ThreatMatch, Verdict},
    services::{
        ProbeError, ReachabilityProbe, RedirectOutcome, RedirectResolver, TlsProbe,
        UrlCheckService, VerdictCache,
    },
    utils::{ThreatLookup, ThreatLookupError},
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::util::ServiceExt;

// =============================================================================
// CONFIG
// =============================================================================

pub fn test_config(api_key: Option<&str>) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            bind_host: "127.0.0.1".to_string(),
            port: 0,
            base_path: "/api".to_string(),
            environment: Environment::Test,
            rust_log: "debug".to_string(),
        },
        safe_browsing: SafeBrowsingConfig {
            api_key: api_key.map(str::to_string),
            api_url: "http://127.0.0.1:9/v4/threatMatches:find".to_string(),
            client_id: "clickshield".to_string(),
            client_version: "1.0.0".to_string(),
            timeout_ms: 2000,
        },
        probes: ProbeConfig::default(),
        cache: CacheConfig::default(),
        cors_allowed_origins: vec!["*".to_string()],
    }
}

// =============================================================================
// SCRIPTED FAKES
// =============================================================================

/// Redirect resolver answering "200, no redirect" unless scripted otherwise
#[derive(Default)]
pub struct FakeRedirects {
    scripted: Mutex<HashMap<String, Result<RedirectOutcome, ProbeError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRedirects {
    pub fn redirect(&self, from: &str, to: &str, status: u16) {
        self.scripted.lock().unwrap().insert(
            from.to_string(),
            Ok(RedirectOutcome {
                final_url: to.to_string(),
                status,
                redirected: true,
            }),
        );
    }

    pub fn status(&self, url: &str, status: u16) {
        self.scripted.lock().unwrap().insert(
            url.to_string(),
            Ok(RedirectOutcome {
                final_url: url.to_string(),
                status,
                redirected: false,
            }),
        );
    }

    pub fn fail(&self, url: &str) {
        self.scripted.lock().unwrap().insert(
            url.to_string(),
            Err(ProbeError::Http("connection refused".to_string())),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RedirectResolver for FakeRedirects {
    async fn resolve_final(&self, url: &str) -> Result<RedirectOutcome, ProbeError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.scripted
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Ok(RedirectOutcome {
                    final_url: url.to_string(),
                    status: 200,
                    redirected: false,
                })
            })
    }
}

/// Resolver where every host resolves except the ones marked unreachable
#[derive(Default)]
pub struct FakeDns {
    unreachable: Mutex<HashSet<String>>,
    slow: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDns {
    pub fn unreachable(&self, hostname: &str) {
        self.unreachable
            .lock()
            .unwrap()
            .insert(hostname.to_string());
    }

    /// Lookups for `hostname` run past the resolver deadline
    pub fn slow(&self, hostname: &str) {
        self.slow.lock().unwrap().insert(hostname.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReachabilityProbe for FakeDns {
    async fn lookup(&self, hostname: &str) -> Result<(), ProbeError> {
        self.calls.lock().unwrap().push(hostname.to_string());
        if self.slow.lock().unwrap().contains(hostname) {
            return Err(ProbeError::Timeout(5000));
        }
        if self.unreachable.lock().unwrap().contains(hostname) {
            Err(ProbeError::Dns(format!("no addresses for {}", hostname)))
        } else {
            Ok(())
        }
    }
}

/// TLS probe that passes every https URL unless told to fail
#[derive(Default)]
pub struct FakeTls {
    failing: Mutex<bool>,
    panicking: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl FakeTls {
    pub fn fail_all(&self) {
        *self.failing.lock().unwrap() = true;
    }

    /// Every verify call panics, as a bug inside the request path would
    pub fn panic_all(&self) {
        *self.panicking.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TlsProbe for FakeTls {
    async fn verify(&self, url: &str) -> Result<(), ProbeError> {
        self.calls.lock().unwrap().push(url.to_string());
        let panicking = *self.panicking.lock().unwrap();
        if panicking {
            panic!("TLS check crashed for {}", url);
        }
        if *self.failing.lock().unwrap() {
            Err(ProbeError::Tls("certificate not trusted".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Threat lookup returning no matches unless scripted otherwise
pub struct FakeThreats {
    configured: bool,
    scripted: Mutex<HashMap<String, Result<Vec<ThreatMatch>, ThreatLookupError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeThreats {
    pub fn new(configured: bool) -> Self {
        Self {
            configured,
            scripted: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn flag(&self, url: &str, threat_type: &str) {
        self.scripted
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(vec![threat_match(url, threat_type)]));
    }

    pub fn fail(&self, url: &str, error: ThreatLookupError) {
        self.scripted
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThreatLookup for FakeThreats {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn find_threats(&self, url: &str) -> Result<Vec<ThreatMatch>, ThreatLookupError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.scripted
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn threat_match(url: &str, threat_type: &str) -> ThreatMatch {
    serde_json::from_value(serde_json::json!({
        "threatType": threat_type,
        "platformType": "ANY_PLATFORM",
        "threat": { "url": url },
        "cacheDuration": "300s",
        "threatEntryType": "URL"
    }))
    .unwrap()
}

// =============================================================================
// TEST APP
// =============================================================================

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub cache: Arc<VerdictCache>,
    pub redirects: Arc<FakeRedirects>,
    pub dns: Arc<FakeDns>,
    pub tls: Arc<FakeTls>,
    pub threats: Arc<FakeThreats>,
}

impl TestApp {
    /// Send a POST request
    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    /// Send a GET request
    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    pub fn request(&self, method: &str, uri: &str) -> TestRequest {
        TestRequest::new(self, method, uri)
    }

    /// POST /check-url with {"url": url}
    pub async fn check(&self, url: &str) -> TestResponse {
        self.post("/check-url")
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
    }

    pub async fn seed(&self, url: &str, verdict: Verdict) {
        self.cache.put(url, verdict).await;
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    request: Request<Body>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &str, uri: &str) -> Self {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        Self { app, request }
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(self, body: &T) -> Self {
        let body_bytes = serde_json::to_vec(body).unwrap();
        self.raw_body(body_bytes)
    }

    /// Replace the body with arbitrary bytes, sent as JSON
    pub fn raw_body(mut self, body: impl Into<Body>) -> Self {
        self.request = Request::builder()
            .method(self.request.method().clone())
            .uri(self.request.uri().clone())
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        self
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let response = self.app.app.clone().oneshot(self.request).await.unwrap();

        TestResponse { response }
    }
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    /// Get status code
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Parse JSON response
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Get response body as text
    pub async fn text(self) -> String {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }
}

/// Setup test application with scripted network collaborators
pub fn setup_test_app() -> TestApp {
    setup_test_app_with_key(Some("test-key"))
}

pub fn setup_test_app_with_key(api_key: Option<&str>) -> TestApp {
    let config = test_config(api_key);

    let cache = Arc::new(VerdictCache::new(Duration::from_secs(300)));
    let redirects = Arc::new(FakeRedirects::default());
    let dns = Arc::new(FakeDns::default());
    let tls = Arc::new(FakeTls::default());
    let threats = Arc::new(FakeThreats::new(api_key.is_some()));

    let url_check = Arc::new(UrlCheckService::new(
        cache.clone(),
        redirects.clone(),
        dns.clone(),
        tls.clone(),
        threats.clone(),
    ));
    let state = AppState::new(Arc::new(config), url_check);

    TestApp {
        app: build_router(state),
        cache,
        redirects,
        dns,
        tls,
        threats,
    }
}

// =============================================================================
// LOCAL SERVERS
// =============================================================================

/// Serve `router` on an ephemeral loopback port
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
