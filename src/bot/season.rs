//! Season screens of the library wizard: the season list, the season
//! detail view and its state-dependent actions.

use anyhow::Result;
use chrono::Utc;

use crate::format;
use crate::sonarr::CommandRequest;
use crate::transport::{Button, Keyboard};

use super::keyboard as kb;
use super::library::LibrarySession;
use super::session::{ActiveWizard, LibraryMode};
use super::Bot;

const T_MONITOR: &str = "SEASON_MONITOR";
const T_UNMONITOR: &str = "SEASON_UNMONITOR";
const T_SEARCH: &str = "SEASON_SEARCH";
const T_MONITOR_SEARCH: &str = "SEASON_MONITOR_SEARCH";
const T_DELETE_FILES: &str = "SEASON_DELETE_FILES";
const T_DELETE_YES: &str = "SEASON_DELETE_YES";
const T_DELETE_NO: &str = "SEASON_DELETE_NO";
const T_BACK: &str = "SEASON_BACK";
const P_NUM: &str = "SEASON_NUM_";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SeasonToken {
    Pick(i32),
    Monitor,
    Unmonitor,
    Search,
    MonitorSearch,
    DeleteFiles,
    DeleteYes,
    DeleteNo,
    Back,
    Cancel,
}

fn decode(token: &str) -> Option<SeasonToken> {
    match token {
        T_MONITOR => return Some(SeasonToken::Monitor),
        T_UNMONITOR => return Some(SeasonToken::Unmonitor),
        T_SEARCH => return Some(SeasonToken::Search),
        T_MONITOR_SEARCH => return Some(SeasonToken::MonitorSearch),
        T_DELETE_FILES => return Some(SeasonToken::DeleteFiles),
        T_DELETE_YES => return Some(SeasonToken::DeleteYes),
        T_DELETE_NO => return Some(SeasonToken::DeleteNo),
        T_BACK => return Some(SeasonToken::Back),
        super::library::T_CANCEL => return Some(SeasonToken::Cancel),
        _ => {}
    }
    token
        .strip_prefix(P_NUM)
        .and_then(|rest| rest.parse().ok())
        .map(SeasonToken::Pick)
}

impl Bot {
    pub(crate) async fn on_season_callback(&self, chat_id: i64, token: &str) -> Result<()> {
        let Some(mut session) = self.sessions.library_session(chat_id) else {
            return self.reject_unrecognized(chat_id).await;
        };
        let Some(token) = decode(token) else {
            return self.reject_unrecognized(chat_id).await;
        };
        if session.detail.is_none() {
            return self.reject_unrecognized(chat_id).await;
        }

        match token {
            SeasonToken::Cancel => self.cancel_library(chat_id, &session).await,
            SeasonToken::Pick(number) => {
                let known = session
                    .detail
                    .as_ref()
                    .is_some_and(|d| d.series.season(number).is_some());
                if !known {
                    return self.reject_unrecognized(chat_id).await;
                }
                session.season_number = Some(number);
                self.store_and_render_season(chat_id, session).await
            }
            SeasonToken::Back => match session.season_number {
                // Season detail backs out to the list, the list backs out
                // to the series screen.
                Some(_) => {
                    session.season_number = None;
                    self.store_and_render_season(chat_id, session).await
                }
                None => {
                    self.sessions
                        .set_active(chat_id, ActiveWizard::Library(LibraryMode::SeriesEdit));
                    self.sessions.set_library_session(chat_id, session.clone());
                    self.render_series_screen(&session).await
                }
            },
            SeasonToken::Monitor => self.set_season_monitored(chat_id, session, true).await,
            SeasonToken::Unmonitor => self.set_season_monitored(chat_id, session, false).await,
            SeasonToken::Search => self.search_season(chat_id, session).await,
            SeasonToken::MonitorSearch => {
                self.set_season_monitored(chat_id, session, true).await?;
                let Some(session) = self.sessions.library_session(chat_id) else {
                    return Ok(());
                };
                let monitored = matches!(
                    (&session.detail, session.season_number),
                    (Some(detail), Some(number))
                        if detail.series.season(number).is_some_and(|s| s.monitored)
                );
                if !monitored {
                    // Monitor failed and was already surfaced; no search.
                    return Ok(());
                }
                self.search_season(chat_id, session).await
            }
            SeasonToken::DeleteFiles => {
                if let Some(detail) = session.detail.as_mut() {
                    detail.confirming_file_delete = true;
                }
                self.store_and_render_season(chat_id, session).await
            }
            SeasonToken::DeleteNo => {
                if let Some(detail) = session.detail.as_mut() {
                    detail.confirming_file_delete = false;
                }
                self.store_and_render_season(chat_id, session).await
            }
            SeasonToken::DeleteYes => self.delete_season_files(chat_id, session).await,
        }
    }

    /// Write the season's monitored flag via a full series update, then
    /// sync the flag onto the season's episodes. The episode sync may fail
    /// after the season write succeeded; the error is surfaced and the
    /// season write stands.
    async fn set_season_monitored(
        &self,
        chat_id: i64,
        mut session: LibrarySession,
        monitored: bool,
    ) -> Result<()> {
        let (Some(mut detail), Some(number)) = (session.detail.clone(), session.season_number)
        else {
            return self.reject_unrecognized(chat_id).await;
        };

        let mut updated = detail.series.clone();
        let Some(season) = updated
            .seasons
            .iter_mut()
            .find(|s| s.season_number == number)
        else {
            return self.reject_unrecognized(chat_id).await;
        };
        season.monitored = monitored;

        match self.server.update_series(&updated).await {
            Ok(series) => {
                detail.series = series;
                detail.reset_pending();
            }
            Err(err) => return self.surface_at(session.message, err).await,
        }

        let episode_ids: Vec<i64> = detail
            .episodes
            .iter()
            .filter(|e| e.season_number == number)
            .map(|e| e.id)
            .collect();
        session.detail = Some(detail);
        self.sessions.set_library_session(chat_id, session.clone());

        if !episode_ids.is_empty() {
            if let Err(err) = self
                .server
                .set_episode_monitored(&episode_ids, monitored)
                .await
            {
                return self.surface_at(session.message, err).await;
            }
        }
        self.store_and_render_season(chat_id, session).await
    }

    async fn search_season(&self, chat_id: i64, mut session: LibrarySession) -> Result<()> {
        let (Some(detail), Some(number)) = (session.detail.clone(), session.season_number) else {
            return self.reject_unrecognized(chat_id).await;
        };
        let command = CommandRequest::season_search(detail.series.id, number);
        if let Err(err) = self.server.send_command(&command).await {
            return self.surface_at(session.message, err).await;
        }
        session.season_last_search.insert(number, Utc::now());
        self.store_and_render_season(chat_id, session).await
    }

    /// Delete every episode file of the season, then unmonitor it, then
    /// refresh the snapshot. A file deletion failure aborts before the
    /// monitored flag is touched.
    async fn delete_season_files(&self, chat_id: i64, mut session: LibrarySession) -> Result<()> {
        let (Some(mut detail), Some(number)) = (session.detail.clone(), session.season_number)
        else {
            return self.reject_unrecognized(chat_id).await;
        };
        detail.confirming_file_delete = false;

        let file_ids: Vec<i64> = detail
            .files
            .iter()
            .filter(|f| f.season_number == number)
            .map(|f| f.id)
            .collect();
        for file_id in file_ids {
            if let Err(err) = self.server.delete_episode_file(file_id).await {
                session.detail = Some(detail);
                self.sessions.set_library_session(chat_id, session.clone());
                return self.surface_at(session.message, err).await;
            }
            tracing::debug!(file_id, season = number, "deleted episode file");
        }

        session.detail = Some(detail);
        self.sessions.set_library_session(chat_id, session.clone());
        self.set_season_monitored(chat_id, session.clone(), false)
            .await?;

        let Some(mut session) = self.sessions.library_session(chat_id) else {
            return Ok(());
        };
        let Some(mut detail) = session.detail.clone() else {
            return Ok(());
        };
        if detail.series.season(number).is_some_and(|s| s.monitored) {
            // Unmonitor failed and was already surfaced.
            return Ok(());
        }
        // Refresh files so the screen stops offering the delete action.
        match self.server.episode_files(detail.series.id).await {
            Ok(files) => detail.files = files,
            Err(err) => return self.surface_at(session.message, err).await,
        }
        session.detail = Some(detail);
        self.store_and_render_season(chat_id, session).await
    }

    async fn store_and_render_season(&self, chat_id: i64, session: LibrarySession) -> Result<()> {
        self.sessions.set_library_session(chat_id, session.clone());
        self.render_season_screen(&session).await
    }

    pub(crate) async fn render_season_screen(&self, session: &LibrarySession) -> Result<()> {
        let Some(detail) = &session.detail else {
            return Ok(());
        };
        let (text, keyboard) = match session.season_number {
            None => render_season_list(detail),
            Some(number) => render_season_detail(session, detail, number),
        };
        self.messenger
            .edit_markup(session.message, &text, keyboard, false)
            .await
    }
}

fn render_season_list(detail: &super::series::SeriesDetail) -> (String, Keyboard) {
    let text = format!("*{}*\n\nSeasons:", format::escape(&detail.series.title));
    let mut keyboard = Keyboard::new();
    for season in &detail.series.seasons {
        keyboard.push_button(Button::new(
            format!(
                "{} {}",
                format::season_label(season.season_number),
                kb::monitor_icon(season.monitored)
            ),
            format!("{}{}", P_NUM, season.season_number),
        ));
    }
    keyboard.push_row(kb::back_row(T_BACK));
    keyboard.push_button(Button::new("Cancel", super::library::T_CANCEL));
    (text, keyboard)
}

fn render_season_detail(
    session: &LibrarySession,
    detail: &super::series::SeriesDetail,
    number: i32,
) -> (String, Keyboard) {
    if detail.confirming_file_delete {
        let text = format!(
            "Delete all files of *{}* {} and unmonitor it?",
            format::escape(&detail.series.title),
            format::escape(&format::season_label(number))
        );
        let keyboard = Keyboard::stacked(&[("Yes, delete", T_DELETE_YES), ("No", T_DELETE_NO)]);
        return (text, keyboard);
    }

    let monitored = detail
        .series
        .season(number)
        .map(|s| s.monitored)
        .unwrap_or(false);
    let total = detail
        .episodes
        .iter()
        .filter(|e| e.season_number == number)
        .count();
    let on_disk = detail
        .files
        .iter()
        .filter(|f| f.season_number == number)
        .count();
    let size: i64 = detail
        .files
        .iter()
        .filter(|f| f.season_number == number)
        .map(|f| f.size)
        .sum();

    let mut text = format!(
        "*{} \\- {}*\n\n",
        format::escape(&detail.series.title),
        format::escape(&format::season_label(number))
    );
    text.push_str(&format!("Monitored: {}\n", kb::monitor_icon(monitored)));
    text.push_str(&format!("Episodes: {}\n", total));
    text.push_str(&format!("Files on disk: {}\n", on_disk));
    text.push_str(&format!("Size on disk: {} GiB\n", format::gibibytes(size)));
    if let Some(at) = session.season_last_search.get(&number) {
        text.push_str(&format!(
            "Last search: {}\n",
            format::escape(&at.format("%Y-%m-%d %H:%M UTC").to_string())
        ));
    }

    let mut keyboard = Keyboard::new();
    if monitored {
        keyboard.push_row(vec![
            Button::new("Unmonitor", T_UNMONITOR),
            Button::new("Search", T_SEARCH),
        ]);
    } else {
        keyboard.push_row(vec![
            Button::new("Monitor", T_MONITOR),
            Button::new("Monitor & Search Now", T_MONITOR_SEARCH),
        ]);
    }
    if on_disk > 0 {
        keyboard.push_button(Button::new("Delete Files & Unmonitor", T_DELETE_FILES));
    }
    keyboard.push_row(kb::back_row(T_BACK));
    keyboard.push_button(Button::new("Cancel", super::library::T_CANCEL));
    (text, keyboard)
}
