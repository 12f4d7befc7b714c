//! Blocking HTTP client for the statistics service
//!
//! Lives on the background fetch worker thread; the UI thread never
//! performs network I/O.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::constants;
use crate::error::{Result, StatsError};

use super::types::{AccessResponse, InsightsResponse, LightsResponse, SummaryResponse};

/// Client for the bot's statistics endpoints
pub struct StatsClient {
    http: Client,
    base_url: String,
}

impl StatsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StatsError::Config("empty base URL".to_string()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(constants::api::REQUEST_TIMEOUT_SEC))
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch binned access counts for one time window
    pub fn access(
        &self,
        end_time_ms: i64,
        range_sec: i64,
        bin_interval_sec: i64,
    ) -> Result<AccessResponse> {
        self.get_json(
            "/api/stats/access",
            &[
                ("endTime", end_time_ms.to_string()),
                ("rangeSec", range_sec.to_string()),
                ("binInterval", bin_interval_sec.to_string()),
            ],
        )
    }

    /// Fetch aggregate counters; `refresh` forces the server to recompute
    pub fn summary(&self, refresh: bool) -> Result<SummaryResponse> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if refresh {
            params.push(("refresh", "true".to_string()));
        }
        self.get_json("/api/stats/summary", &params)
    }

    /// Fetch global and per-area outage/load statistics
    pub fn insights(&self) -> Result<InsightsResponse> {
        self.get_json("/api/stats/insights", &[])
    }

    /// Fetch ordered light on/off events per area for an interval
    pub fn lights(&self, start_ms: i64, end_ms: i64) -> Result<LightsResponse> {
        self.get_json(
            "/api/stats/lights",
            &[
                ("startTime", start_ms.to_string()),
                ("endTime", end_ms.to_string()),
            ],
        )
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let body = self
            .http
            .get(&url)
            .query(params)
            .send()?
            .error_for_status()?
            .text()?;
        serde_json::from_str(&body).map_err(|e| StatsError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let client = StatsClient::new("http://stats.example/").unwrap();
        assert_eq!(client.base_url(), "http://stats.example");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            StatsClient::new(""),
            Err(StatsError::Config(_))
        ));
    }
}
