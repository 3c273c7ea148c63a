//! Fake generative model service
//!
//! Speaks just enough of the `generateContent` wire format for the server's
//! real provider to talk to it. Validation prompts get a scripted verdict,
//! every other request gets the scripted image (or none).

#![allow(dead_code)]

use super::constants::*;
use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use hairline_server::generative::prompts::VALIDATION_PROMPT;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One request as the fake upstream saw it
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    pub api_key: String,
    pub texts: Vec<String>,
    pub image_count: usize,
}

impl UpstreamCall {
    pub fn is_validation(&self) -> bool {
        self.texts.first().map(String::as_str) == Some(VALIDATION_PROMPT)
    }
}

#[derive(Clone)]
struct UpstreamState {
    verdict: String,
    image: Option<(String, String)>,
    calls: Arc<Mutex<Vec<UpstreamCall>>>,
}

pub struct FakeUpstream {
    pub base_url: String,
    calls: Arc<Mutex<Vec<UpstreamCall>>>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeUpstream {
    /// `image` is the data URI returned for generation requests.
    pub async fn spawn(verdict: &str, image: Option<String>) -> Self {
        let image = image.map(|uri| {
            let uri = hairline_server::imaging::DataUri::parse(&uri)
                .expect("Upstream image is not a data URI");
            (uri.mime_type().to_string(), uri.payload().to_string())
        });
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = UpstreamState {
            verdict: verdict.to_string(),
            image,
            calls: calls.clone(),
        };

        let app = Router::new()
            .route(
                &format!("/models/{}:generateContent", FAKE_MODEL),
                post(generate_content),
            )
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake upstream");
        let port = listener.local_addr().expect("No local address").port();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake upstream failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            calls,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn generate_content(
    State(state): State<UpstreamState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let parts = body["contents"][0]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    let call = UpstreamCall {
        api_key: api_key.clone(),
        texts: parts
            .iter()
            .filter_map(|p| p["text"].as_str().map(str::to_string))
            .collect(),
        image_count: parts.iter().filter(|p| p.get("inlineData").is_some()).count(),
    };
    let is_validation = call.is_validation();
    state.calls.lock().unwrap().push(call);

    if api_key == REFUSED_KEY {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"message": "API key not valid"}})),
        );
    }

    let parts = if is_validation {
        json!([{"text": state.verdict}])
    } else {
        match &state.image {
            Some((mime_type, data)) => json!([
                {"text": "Here is the simulation"},
                {"inlineData": {"mimeType": mime_type, "data": data}}
            ]),
            None => json!([{"text": "I cannot help with that"}]),
        }
    };

    (
        StatusCode::OK,
        Json(json!({"candidates": [{"content": {"parts": parts}}]})),
    )
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
