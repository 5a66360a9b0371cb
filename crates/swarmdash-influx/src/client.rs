//! HTTP client for the `InfluxDB` 2.x query API.
//!
//! One Flux query per call: `POST {url}/api/v2/query?org={org}` with a
//! token header and a Flux body, annotated CSV back. Query text is
//! built by [`flux`](crate::flux); responses are decoded by
//! [`csv`](crate::csv).

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::csv::{self, Record};
use crate::error::InfluxError;

/// Connection settings for the metrics store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfluxConfig {
    /// Base URL of the `InfluxDB` instance.
    #[serde(default = "default_url")]
    pub url: String,

    /// Organization the token is scoped to.
    #[serde(default = "default_org")]
    pub org: String,

    /// API token. Usually supplied via the `INFLUXDB_TOKEN`
    /// environment variable rather than the config file.
    #[serde(default)]
    pub token: String,

    /// Bucket holding the swarm's metrics.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Window for run-id discovery, in days.
    #[serde(default = "default_run_window_days")]
    pub run_window_days: u32,

    /// Window for miner and validator series queries, in days.
    #[serde(default = "default_series_window_days")]
    pub series_window_days: u32,

    /// Window for the evaluation-loss curve, in days. Evaluations are
    /// sparse, so this reaches much further back than the series
    /// window.
    #[serde(default = "default_eval_window_days")]
    pub eval_window_days: u32,

    /// HTTP timeout per query, in seconds. Aggregating a month of
    /// miner metrics server-side can take minutes.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    String::from("http://127.0.0.1:8086")
}

fn default_org() -> String {
    String::from("distributed-training")
}

fn default_bucket() -> String {
    String::from("distributed-training-metrics")
}

const fn default_run_window_days() -> u32 {
    7
}

const fn default_series_window_days() -> u32 {
    30
}

const fn default_eval_window_days() -> u32 {
    365
}

const fn default_timeout_secs() -> u64 {
    260
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            org: default_org(),
            token: String::new(),
            bucket: default_bucket(),
            run_window_days: default_run_window_days(),
            series_window_days: default_series_window_days(),
            eval_window_days: default_eval_window_days(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InfluxConfig {
    /// Apply environment overrides for connection secrets.
    ///
    /// `INFLUXDB_URL` overrides `url` and `INFLUXDB_TOKEN` overrides
    /// `token`, so the token can stay out of the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("INFLUXDB_URL") {
            self.url = url;
        }
        if let Ok(token) = std::env::var("INFLUXDB_TOKEN") {
            self.token = token;
        }
    }
}

/// A client for the `InfluxDB` 2.x query API.
pub struct InfluxClient {
    http: reqwest::Client,
    url: String,
    org: String,
    token: String,
}

impl InfluxClient {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`InfluxError::Http`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &InfluxConfig) -> Result<Self, InfluxError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_owned(),
            org: config.org.clone(),
            token: config.token.clone(),
        })
    }

    /// Run one Flux query and decode the annotated-CSV response.
    ///
    /// # Errors
    ///
    /// Returns [`InfluxError::Http`] on transport failure,
    /// [`InfluxError::Api`] on a non-success status, and
    /// [`InfluxError::Decode`] when the response cannot be decoded.
    pub async fn query(&self, flux: &str) -> Result<Vec<Record>, InfluxError> {
        let url = format!("{}/api/v2/query", self.url);

        let response = self
            .http
            .post(&url)
            .query(&[("org", self.org.as_str())])
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "application/vnd.flux")
            .header("Accept", "application/csv")
            .body(flux.to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unable to read error body"));
            return Err(InfluxError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let records = csv::decode(&body)?;
        debug!(records = records.len(), "Flux query decoded");
        Ok(records)
    }
}
