//! HTTP-level tests of the Sonarr client: auth header, wire shapes and
//! error surfacing.

use telesonarr::sonarr::{AddSeriesInput, AddSeriesOptions, SeriesServer, SonarrClient};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn lookup_sends_the_api_key_and_encoded_term() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series/lookup"))
        .and(query_param("term", "breaking bad"))
        .and(header("X-Api-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"title": "Breaking Bad", "year": 2008, "tvdbId": 81189}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SonarrClient::new(&server.uri(), "secret");
    let results = client.lookup("breaking bad").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tvdb_id, 81189);
    assert!(!results[0].in_library());
}

#[tokio::test]
async fn error_bodies_are_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is locked"))
        .mount(&server)
        .await;

    let client = SonarrClient::new(&server.uri(), "secret");
    let err = client.all_series().await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("500"), "missing status in: {}", text);
    assert!(text.contains("database is locked"), "missing body in: {}", text);
}

#[tokio::test]
async fn add_series_posts_camel_case_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/series"))
        .and(header("X-Api-Key", "secret"))
        .and(body_partial_json(serde_json::json!({
            "tvdbId": 81189,
            "qualityProfileId": 4,
            "rootFolderPath": "/tv",
            "seasonFolder": true,
            "monitored": true,
            "addOptions": {
                "monitor": "all",
                "searchForMissingEpisodes": true,
                "searchForCutoffUnmetEpisodes": false
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!(
            {"id": 12, "title": "Breaking Bad", "tvdbId": 81189}
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = SonarrClient::new(&server.uri(), "secret");
    let input = AddSeriesInput {
        tvdb_id: 81189,
        title: "Breaking Bad".to_string(),
        quality_profile_id: 4,
        root_folder_path: "/tv".to_string(),
        series_type: "standard".to_string(),
        season_folder: true,
        monitored: true,
        tags: vec![],
        add_options: AddSeriesOptions {
            monitor: "all".to_string(),
            search_for_missing_episodes: true,
            search_for_cutoff_unmet_episodes: false,
        },
    };
    let added = client.add_series(&input).await.unwrap();
    assert_eq!(added.id, 12);
}

#[tokio::test]
async fn delete_series_passes_the_file_flag() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/series/7"))
        .and(query_param("deleteFiles", "true"))
        .and(query_param("addImportListExclusion", "false"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = SonarrClient::new(&server.uri(), "secret");
    client.delete_series(7, true).await.unwrap();
}

#[tokio::test]
async fn calendar_requests_unmonitored_episodes_too() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/calendar"))
        .and(query_param("unmonitored", "true"))
        .and(query_param("includeSeries", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SonarrClient::new(&server.uri(), "secret");
    let start = chrono::Utc::now();
    let episodes = client.calendar(start, start + chrono::Duration::days(30)).await.unwrap();
    assert!(episodes.is_empty());
}

#[tokio::test]
async fn episode_monitor_uses_a_put_with_ids() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/episode/monitor"))
        .and(body_partial_json(serde_json::json!({
            "episodeIds": [10, 11],
            "monitored": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SonarrClient::new(&server.uri(), "secret");
    client.set_episode_monitored(&[10, 11], false).await.unwrap();
}
