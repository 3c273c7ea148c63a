//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server backed by its own fake model upstream.

use super::constants::*;
use super::fixtures::{create_reference_catalog, png_data_uri};
use super::upstream::FakeUpstream;
use hairline_server::generative::{ApiKeySource, GeminiProvider};
use hairline_server::imaging::BackendKind;
use hairline_server::reference::ReferenceCatalog;
use hairline_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use hairline_server::Simulator;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Knobs for a single test server
#[derive(Debug, Clone)]
pub struct TestServerOptions {
    /// Key the server holds itself; `None` makes clients supply one.
    pub server_key: Option<String>,
    /// Validation answer from the fake model.
    pub verdict: String,
    /// Image the fake model generates; `None` makes it answer with text only.
    pub generated_image: Option<String>,
    pub with_references: bool,
    pub body_limit_bytes: usize,
    pub backend: BackendKind,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            server_key: Some(SERVER_KEY.to_string()),
            verdict: "TRUE".to_string(),
            generated_image: Some(png_data_uri(
                PHOTO_WIDTH,
                PHOTO_HEIGHT,
                GENERATED_COLOR,
            )),
            with_references: false,
            body_limit_bytes: 50 * 1024 * 1024,
            backend: BackendKind::Buffer,
        }
    }
}

/// Test server instance with its fake upstream
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The fake model service, for inspecting what the server sent
    pub upstream: FakeUpstream,

    // Private fields - keep resources alive until drop
    _temp_references_dir: Option<TempDir>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the upstream or server fails to start, or the server
    /// doesn't become ready within timeout.
    pub async fn spawn(options: TestServerOptions) -> Self {
        let upstream = FakeUpstream::spawn(&options.verdict, options.generated_image.clone()).await;

        let temp_references_dir = if options.with_references {
            Some(create_reference_catalog().expect("Failed to create reference catalog"))
        } else {
            None
        };
        let references = temp_references_dir
            .as_ref()
            .map(|dir| ReferenceCatalog::new(dir.path()));

        let key_source = match &options.server_key {
            Some(key) => ApiKeySource::Static(key.clone()),
            None => ApiKeySource::None,
        };
        let model = GeminiProvider::new(upstream.base_url.clone(), FAKE_MODEL)
            .with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        let simulator = Arc::new(
            Simulator::new(Arc::new(model), references, key_source).with_backend(options.backend),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            frontend_dir_path: None,
            body_limit_bytes: options.body_limit_bytes,
        };
        let app = make_app(config, simulator).expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            upstream,
            _temp_references_dir: temp_references_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the health endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/api/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
