//! Sonarr v3 API payloads. Only the fields the bot reads or writes are
//! modeled; everything is camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    /// Zero until the series exists in the library.
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub year: i32,
    pub tvdb_id: i64,
    #[serde(default)]
    pub imdb_id: String,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ended: bool,
    #[serde(default)]
    pub series_type: String,
    #[serde(default)]
    pub quality_profile_id: i64,
    #[serde(default)]
    pub root_folder_path: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub statistics: Option<SeriesStatistics>,
}

impl Series {
    /// True once Sonarr has assigned a library id.
    pub fn in_library(&self) -> bool {
        self.id != 0
    }

    pub fn size_on_disk(&self) -> i64 {
        self.statistics.as_ref().map_or(0, |s| s.size_on_disk)
    }

    pub fn season(&self, season_number: i32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.season_number == season_number)
    }

    /// Any season has files on disk.
    pub fn has_file_on_disk(&self) -> bool {
        self.seasons
            .iter()
            .any(|s| s.statistics.as_ref().map_or(0, |st| st.size_on_disk) > 0)
    }

    /// Any season is missing episodes it should have.
    pub fn has_missing_episodes(&self) -> bool {
        self.seasons.iter().any(|s| {
            s.statistics
                .as_ref()
                .is_some_and(|st| st.episode_file_count < st.total_episode_count)
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub season_number: i32,
    pub monitored: bool,
    #[serde(default)]
    pub statistics: Option<SeasonStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonStatistics {
    #[serde(default)]
    pub episode_file_count: i64,
    #[serde(default)]
    pub total_episode_count: i64,
    #[serde(default)]
    pub size_on_disk: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStatistics {
    #[serde(default)]
    pub episode_file_count: i64,
    #[serde(default)]
    pub size_on_disk: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfile {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFolder {
    pub path: String,
    #[serde(default)]
    pub free_space: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i32,
    pub episode_number: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub air_date_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub has_file: bool,
    /// Embedded by the calendar endpoint when `includeSeries` is set.
    #[serde(default)]
    pub series: Option<Box<Series>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeFile {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i32,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub relative_path: String,
}

/// Payload for POST /series.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddSeriesInput {
    pub tvdb_id: i64,
    pub title: String,
    pub quality_profile_id: i64,
    pub root_folder_path: String,
    pub series_type: String,
    pub season_folder: bool,
    pub monitored: bool,
    pub tags: Vec<i64>,
    pub add_options: AddSeriesOptions,
}

/// Search-on-add behavior of a create-series request.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddSeriesOptions {
    pub monitor: String,
    pub search_for_missing_episodes: bool,
    pub search_for_cutoff_unmet_episodes: bool,
}

/// Payload for POST /command.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_ids: Option<Vec<i64>>,
}

impl CommandRequest {
    pub fn named(name: &str) -> Self {
        CommandRequest {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn series_search(series_id: i64) -> Self {
        CommandRequest {
            name: "SeriesSearch".to_string(),
            series_id: Some(series_id),
            ..Default::default()
        }
    }

    pub fn season_search(series_id: i64, season_number: i32) -> Self {
        CommandRequest {
            name: "SeasonSearch".to_string(),
            series_id: Some(series_id),
            season_number: Some(season_number),
            ..Default::default()
        }
    }

    /// Batched command targeting several series in one request.
    pub fn for_series(name: &str, series_ids: Vec<i64>) -> Self {
        CommandRequest {
            name: name.to_string(),
            series_ids: Some(series_ids),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_library_series() {
        let json = serde_json::json!({
            "id": 7,
            "title": "The Expanse",
            "year": 2015,
            "tvdbId": 280619,
            "imdbId": "tt3230854",
            "monitored": true,
            "status": "ended",
            "ended": true,
            "seriesType": "standard",
            "qualityProfileId": 4,
            "tags": [1, 2],
            "seasons": [
                {"seasonNumber": 1, "monitored": true,
                 "statistics": {"episodeFileCount": 10, "totalEpisodeCount": 10, "sizeOnDisk": 1024}}
            ],
            "statistics": {"episodeFileCount": 10, "sizeOnDisk": 1024}
        });
        let series: Series = serde_json::from_value(json).unwrap();
        assert!(series.in_library());
        assert!(series.has_file_on_disk());
        assert!(!series.has_missing_episodes());
        assert_eq!(series.season(1).unwrap().season_number, 1);
    }

    #[test]
    fn lookup_result_without_id_is_not_in_library() {
        let json = serde_json::json!({"title": "New Show", "tvdbId": 42});
        let series: Series = serde_json::from_value(json).unwrap();
        assert!(!series.in_library());
    }

    #[test]
    fn command_request_skips_absent_fields() {
        let body = serde_json::to_value(CommandRequest::named("RssSync")).unwrap();
        assert_eq!(body, serde_json::json!({"name": "RssSync"}));

        let body = serde_json::to_value(CommandRequest::season_search(5, 2)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"name": "SeasonSearch", "seriesId": 5, "seasonNumber": 2})
        );

        let body =
            serde_json::to_value(CommandRequest::for_series("SeriesSearch", vec![1, 3])).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"name": "SeriesSearch", "seriesIds": [1, 3]})
        );
    }
}
