//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which opens every store on a temporary data
//! directory and builds a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing, and
//! [`MockProvider`] stands up a wiremock addon.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hb_core::config::Config;
use hb_server::context::AppContext;
use hb_server::router::build_router;
use hb_store::Stores;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temporary data directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub config: Config,
    pub data_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with a one-second provider timeout.
    pub fn new() -> Self {
        let mut config = Config::default();
        config.resolver.provider_timeout_secs = 1;
        Self::with_config(config)
    }

    /// Create a new harness with a custom configuration. `server.data_dir`
    /// is replaced by a fresh temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let data_dir = tempfile::tempdir().expect("failed to create temp dir");
        config.server.data_dir = data_dir.path().to_path_buf();
        let stores = Stores::open(data_dir.path(), &config);
        let ctx = AppContext::new(config.clone(), stores);
        Self {
            ctx,
            config,
            data_dir,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.ctx.stores
    }

    /// Load the same data directory again, as a restarted process would.
    pub fn reopen(&self) -> Stores {
        Stores::open(self.data_dir.path(), &self.config)
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let addr = harness.serve().await;
        (harness, addr)
    }

    /// Serve this harness' context on a random port.
    pub async fn serve(&self) -> SocketAddr {
        let app = build_router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        addr
    }

    /// Register a provider through the store, bypassing HTTP.
    pub async fn register(&self, provider: &MockProvider, name: &str) {
        self.ctx
            .stores
            .providers
            .add(&provider.manifest_url(), Some(name.into()), None)
            .await
            .expect("failed to register provider");
    }
}

/// A wiremock server posing as a stream addon.
pub struct MockProvider {
    pub server: MockServer,
}

impl MockProvider {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/manifest.json", self.server.uri())
    }

    /// Answer `stream_path` (e.g. `/stream/movie/tt1.json`) with one stream
    /// per title, expecting exactly `calls` requests.
    pub async fn serve_streams(&self, stream_path: &str, titles: &[&str], calls: u64) {
        Mock::given(method("GET"))
            .and(path(stream_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(streams_body(titles)))
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Answer every request after `delay`.
    pub async fn serve_slowly(&self, delay: Duration) {
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(streams_body(&["too late"]))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }
}

pub fn streams_body(titles: &[&str]) -> Value {
    let streams: Vec<Value> = titles
        .iter()
        .map(|t| json!({ "title": t, "url": format!("https://cdn.example/{t}.mp4") }))
        .collect();
    json!({ "streams": streams })
}

pub fn titles(body: &Value) -> Vec<String> {
    body["streams"]
        .as_array()
        .map(|streams| {
            streams
                .iter()
                .filter_map(|s| s["title"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
