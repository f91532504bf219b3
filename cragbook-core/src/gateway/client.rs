//! HTTP client for the climbing backend API
//!
//! Endpoints used:
//! - `GET  /api/stats/{user}` - headline stats, also the reachability probe
//! - `GET  /api/sessions/{user}` - saved sessions with their climbs
//! - `GET  /api/grade_pyramid/{user}` - server-side grade histogram
//! - `POST /api/session` - save a finished session

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::types::{BackendStats, GradePyramid, HistoricSession};

use super::payload::SessionPayload;

/// Operations the session core needs from the backend.
///
/// Read methods fail with [`Error::Fetch`]; `save_session` fails with
/// [`Error::Save`]. Timeouts and transport errors are reported the same way
/// as non-success responses.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_stats(&self, user_name: &str) -> Result<BackendStats>;

    async fn fetch_sessions(&self, user_name: &str) -> Result<Vec<HistoricSession>>;

    async fn fetch_grade_pyramid(&self, user_name: &str) -> Result<GradePyramid>;

    async fn save_session(&self, payload: &SessionPayload) -> Result<()>;
}

/// [`Backend`] over HTTP
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.trim().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, endpoint: &str, user_name: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.base_url,
            endpoint,
            urlencoding::encode(user_name.trim())
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(%url, "GET");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Fetch(format!("failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Fetch(format!("API error ({}): {}", status, error_text)))
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_stats(&self, user_name: &str) -> Result<BackendStats> {
        self.get_json(&self.user_url("stats", user_name)).await
    }

    async fn fetch_sessions(&self, user_name: &str) -> Result<Vec<HistoricSession>> {
        self.get_json(&self.user_url("sessions", user_name)).await
    }

    async fn fetch_grade_pyramid(&self, user_name: &str) -> Result<GradePyramid> {
        self.get_json(&self.user_url("grade_pyramid", user_name))
            .await
    }

    async fn save_session(&self, payload: &SessionPayload) -> Result<()> {
        let url = format!("{}/api/session", self.base_url);
        tracing::debug!(%url, climbs = payload.climbs.len(), "POST");

        let response = self
            .http_client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Save(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Save(format!("API error ({}): {}", status, error_text)))
        }
    }
}
