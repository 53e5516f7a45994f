//! Dispatcher behavior and the one-shot utility commands.

mod common;

use common::{episode, library_series, lookup_series, profile, root_folder, Harness, CHAT};
use telesonarr::transport::Event;

#[tokio::test]
async fn bare_text_is_treated_as_a_search() {
    let harness = Harness::new();
    *harness.server.lookup_results.lock() = vec![lookup_series("Dark", 2017, 332484)];
    *harness.server.profiles.lock() = vec![profile(1, "Any")];
    *harness.server.root_folders.lock() = vec![root_folder("/tv")];

    harness
        .bot
        .handle_event(Event::text(CHAT, "dark"))
        .await
        .unwrap();
    assert!(harness
        .messenger
        .tokens()
        .contains(&"ADDSERIES_TVDBID_332484".to_string()));
}

#[tokio::test]
async fn empty_query_sends_a_usage_hint() {
    let harness = Harness::new();
    harness.command("q", "").await.unwrap();
    assert!(harness.messenger.last_sent().starts_with("Usage:"));
}

#[tokio::test]
async fn stray_callbacks_clear_everything() {
    let harness = Harness::new();
    harness.press("DELETE_YES").await.unwrap();
    assert_eq!(
        harness.messenger.last_sent(),
        "I am not sure what you mean.\nAll commands have been cleared"
    );
}

#[tokio::test]
async fn clear_cancels_an_active_wizard() {
    let harness = Harness::new();
    *harness.server.lookup_results.lock() = vec![lookup_series("Dark", 2017, 332484)];

    harness.command("q", "dark").await.unwrap();
    harness.command("clear", "").await.unwrap();
    assert_eq!(harness.messenger.last_sent(), "All commands have been cleared");

    // The wizard is gone.
    harness.press("ADDSERIES_TVDBID_332484").await.unwrap();
    assert!(harness.messenger.last_sent().contains("I am not sure what you mean"));
}

#[tokio::test]
async fn starting_a_new_wizard_replaces_the_old_one() {
    let harness = Harness::new();
    *harness.server.lookup_results.lock() = vec![lookup_series("Dark", 2017, 332484)];
    *harness.server.library.lock() = vec![library_series(1, "Dark", 332484, true)];

    harness.command("q", "dark").await.unwrap();
    harness.command("delete", "").await.unwrap();
    // The add wizard's marker was overwritten; its token now clears state.
    harness.press("ADDSERIES_TVDBID_332484").await.unwrap();
    assert!(harness.messenger.last_sent().contains("I am not sure what you mean"));
}

#[tokio::test]
async fn unknown_commands_get_the_help_text() {
    let harness = Harness::new();
    harness.command("bogus", "").await.unwrap();
    assert!(harness.messenger.last_sent().starts_with("Commands:"));
}

#[tokio::test]
async fn id_echoes_the_chat_id() {
    let harness = Harness::new();
    harness.command("id", "").await.unwrap();
    assert_eq!(harness.messenger.last_sent(), format!("Your chat id: {}", CHAT));
}

#[tokio::test]
async fn rss_sync_sends_the_command() {
    let harness = Harness::new();
    harness.command("rss", "").await.unwrap();
    assert_eq!(harness.server.commands.lock()[0].name, "RssSync");
    assert_eq!(harness.messenger.last_sent(), "RSS sync started");
}

#[tokio::test]
async fn rss_failure_is_surfaced_verbatim() {
    let harness = Harness::new();
    *harness.server.fail_commands.lock() = true;
    harness.command("rss", "").await.unwrap();
    assert!(harness.messenger.last_sent().contains("command RssSync failed"));
}

#[tokio::test]
async fn free_space_renders_a_table() {
    let harness = Harness::new();
    *harness.server.root_folders.lock() = vec![root_folder("/tv"), root_folder("/tv2")];
    harness.command("free", "").await.unwrap();
    let text = harness.messenger.last_markup_text();
    assert!(text.contains("/tv:"));
    assert!(text.contains("/tv2:"));
    assert!(text.contains("100\\.0 GB"));
}

#[tokio::test]
async fn upcoming_reports_an_empty_window() {
    let harness = Harness::new();
    harness.command("up", "").await.unwrap();
    assert_eq!(
        harness.messenger.last_edited(),
        "No upcoming releases in the next 30 days"
    );
}

#[tokio::test]
async fn search_monitored_sends_one_batched_command() {
    let harness = Harness::new();
    *harness.server.library.lock() = vec![
        library_series(1, "Dark", 1001, true),
        library_series(2, "Fargo", 1002, false),
        library_series(3, "Severance", 1003, true),
    ];
    harness.command("searchmonitored", "").await.unwrap();
    let commands = harness.server.commands.lock();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].name, "SeriesSearch");
    assert_eq!(commands[0].series_ids, Some(vec![1, 3]));
    assert_eq!(commands[0].series_id, None);
    drop(commands);
    assert!(harness.messenger.last_edited().contains("2 monitored series"));
}

#[tokio::test]
async fn search_monitored_with_nothing_monitored_sends_no_command() {
    let harness = Harness::new();
    *harness.server.library.lock() = vec![library_series(2, "Fargo", 1002, false)];
    harness.command("searchmonitored", "").await.unwrap();
    assert!(harness.server.commands.lock().is_empty());
    assert_eq!(
        harness.messenger.last_edited(),
        "No monitored series in the library"
    );
}

#[tokio::test]
async fn update_all_refreshes_every_series_in_one_command() {
    let harness = Harness::new();
    *harness.server.library.lock() = vec![
        library_series(1, "Dark", 1001, true),
        library_series(2, "Fargo", 1002, false),
    ];
    harness.command("updateall", "").await.unwrap();
    let commands = harness.server.commands.lock();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].name, "RefreshSeries");
    assert_eq!(commands[0].series_ids, Some(vec![1, 2]));
}

#[tokio::test]
async fn system_status_is_pretty_printed() {
    let harness = Harness::new();
    harness.command("system", "").await.unwrap();
    assert!(harness.messenger.last_sent().contains("\"version\": \"4.0.0.0\""));
}

#[tokio::test]
async fn utility_commands_leave_an_active_wizard_alone() {
    let harness = Harness::new();
    *harness.server.lookup_results.lock() = vec![lookup_series("Dark", 2017, 332484)];
    *harness.server.profiles.lock() = vec![profile(1, "Any")];
    *harness.server.root_folders.lock() = vec![root_folder("/tv")];

    harness.command("q", "dark").await.unwrap();
    harness.command("rss", "").await.unwrap();

    // The add wizard still owns its tokens.
    harness.press("ADDSERIES_TVDBID_332484").await.unwrap();
    assert!(harness.messenger.tokens().contains(&"ADDSERIES_YES".to_string()));
}

#[tokio::test]
async fn upcoming_lists_episodes_with_their_series() {
    let harness = Harness::new();
    let mut ep = episode(1, 1, 2, 3);
    ep.series = Some(Box::new(lookup_series("Dark", 2017, 332484)));
    *harness.server.upcoming.lock() = vec![ep];

    harness.command("up", "").await.unwrap();
    let text = harness.messenger.last_markup_text();
    assert!(text.contains("Dark S02E03"));
}
