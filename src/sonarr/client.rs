use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::*;
use super::SeriesServer;

/// Request timeout for Sonarr API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Sonarr v3 API.
pub struct SonarrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SonarrClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v3{}", self.base_url, path)
    }

    /// Convert a non-2xx response into an error carrying the body verbatim;
    /// the wizards surface that text to the user unmodified.
    async fn check(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sonarr request {} failed ({}): {}", path, status, body);
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", path))?;
        Self::check(response, path)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to decode response of {}", path))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to POST {}", path))?;
        Self::check(response, path)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to decode response of {}", path))
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .put(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to PUT {}", path))?;
        Self::check(response, path)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to decode response of {}", path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to DELETE {}", path))?;
        Self::check(response, path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SeriesServer for SonarrClient {
    async fn lookup(&self, term: &str) -> Result<Vec<Series>> {
        let encoded: String = url_encode(term);
        self.get_json(&format!("/series/lookup?term={}", encoded))
            .await
    }

    async fn all_series(&self) -> Result<Vec<Series>> {
        self.get_json("/series").await
    }

    async fn series(&self, id: i64) -> Result<Series> {
        self.get_json(&format!("/series/{}", id)).await
    }

    async fn add_series(&self, input: &AddSeriesInput) -> Result<Series> {
        self.post_json("/series", input).await
    }

    async fn update_series(&self, series: &Series) -> Result<Series> {
        self.put_json(&format!("/series/{}", series.id), series)
            .await
    }

    async fn delete_series(&self, id: i64, delete_files: bool) -> Result<()> {
        self.delete(&format!(
            "/series/{}?deleteFiles={}&addImportListExclusion=false",
            id, delete_files
        ))
        .await
    }

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        self.get_json("/qualityprofile").await
    }

    async fn root_folders(&self) -> Result<Vec<RootFolder>> {
        self.get_json("/rootfolder").await
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        self.get_json("/tag").await
    }

    async fn episodes(&self, series_id: i64) -> Result<Vec<Episode>> {
        self.get_json(&format!("/episode?seriesId={}", series_id))
            .await
    }

    async fn episode_files(&self, series_id: i64) -> Result<Vec<EpisodeFile>> {
        self.get_json(&format!("/episodefile?seriesId={}", series_id))
            .await
    }

    async fn delete_episode_file(&self, id: i64) -> Result<()> {
        self.delete(&format!("/episodefile/{}", id)).await
    }

    async fn set_episode_monitored(&self, episode_ids: &[i64], monitored: bool) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct MonitorBody<'a> {
            episode_ids: &'a [i64],
            monitored: bool,
        }

        let _: serde_json::Value = self
            .put_json(
                "/episode/monitor",
                &MonitorBody {
                    episode_ids,
                    monitored,
                },
            )
            .await?;
        Ok(())
    }

    async fn send_command(&self, command: &CommandRequest) -> Result<()> {
        let _: serde_json::Value = self.post_json("/command", command).await?;
        Ok(())
    }

    async fn calendar(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Episode>> {
        self.get_json(&format!(
            "/calendar?start={}&end={}&unmonitored=true&includeSeries=true",
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ))
        .await
    }

    async fn system_status(&self) -> Result<serde_json::Value> {
        self.get_json("/system/status").await
    }
}

/// Minimal query-string escaping for the lookup term.
fn url_encode(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for byte in term.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
