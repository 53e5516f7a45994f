mod client;
mod types;

pub use client::SonarrClient;
pub use types::*;

use anyhow::Result;
use chrono::{DateTime, Utc};

/// Operations the bot needs from the media server. The wizards only ever
/// talk to this trait, so tests substitute an in-memory fake.
#[async_trait::async_trait]
pub trait SeriesServer: Send + Sync {
    /// Free-text title search against the indexers.
    async fn lookup(&self, term: &str) -> Result<Vec<Series>>;

    /// Every series in the library.
    async fn all_series(&self) -> Result<Vec<Series>>;

    /// One library series by its Sonarr id.
    async fn series(&self, id: i64) -> Result<Series>;

    async fn add_series(&self, input: &AddSeriesInput) -> Result<Series>;

    /// Full-object update of a library series.
    async fn update_series(&self, series: &Series) -> Result<Series>;

    async fn delete_series(&self, id: i64, delete_files: bool) -> Result<()>;

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>>;

    async fn root_folders(&self) -> Result<Vec<RootFolder>>;

    async fn tags(&self) -> Result<Vec<Tag>>;

    async fn episodes(&self, series_id: i64) -> Result<Vec<Episode>>;

    async fn episode_files(&self, series_id: i64) -> Result<Vec<EpisodeFile>>;

    async fn delete_episode_file(&self, id: i64) -> Result<()>;

    /// Flip the monitored flag on a batch of episodes.
    async fn set_episode_monitored(&self, episode_ids: &[i64], monitored: bool) -> Result<()>;

    async fn send_command(&self, command: &CommandRequest) -> Result<()>;

    /// Episodes airing in the given window, with their series embedded.
    async fn calendar(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Episode>>;

    /// Raw system status, surfaced to the user as pretty JSON.
    async fn system_status(&self) -> Result<serde_json::Value>;
}
