//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per API endpoint.
//! When API routes or request formats change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Health
    // ========================================================================

    pub async fn health(&self) -> Response {
        self.get("/api/health").await
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Simulation Endpoints
    // ========================================================================

    pub async fn validate(&self, patient_image: &str, api_key: Option<&str>) -> Response {
        let mut body = json!({ "patientImage": patient_image });
        if let Some(key) = api_key {
            body["apiKey"] = json!(key);
        }
        self.post_json("/api/v1/validate", &body).await
    }

    pub async fn simulate(
        &self,
        patient_image: &str,
        mask: Option<&str>,
        density: Option<&str>,
        api_key: Option<&str>,
    ) -> Response {
        let mut body = json!({ "patientImage": patient_image });
        if let Some(mask) = mask {
            body["mask"] = json!(mask);
        }
        if let Some(density) = density {
            body["density"] = json!(density);
        }
        if let Some(key) = api_key {
            body["apiKey"] = json!(key);
        }
        self.post_json("/api/v1/simulate", &body).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn post_raw(&self, path: &str, body: String) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Request failed")
    }
}
