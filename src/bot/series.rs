//! Series screen of the library wizard: detail view with write-through
//! actions, delete confirmation, and the accumulate-then-submit edit
//! sub-wizard.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::Utc;

use crate::format;
use crate::sonarr::{CommandRequest, Episode, EpisodeFile, QualityProfile, Series, Tag};
use crate::transport::{Button, Keyboard};

use super::keyboard as kb;
use super::library::LibrarySession;
use super::session::{ActiveWizard, LibraryMode};
use super::Bot;

const T_MONITOR: &str = "SERIES_MONITOR";
const T_UNMONITOR: &str = "SERIES_UNMONITOR";
const T_SEARCH: &str = "SERIES_SEARCH";
const T_MONITOR_SEARCH: &str = "SERIES_MONITOR_SEARCH";
const T_SEASONS: &str = "SERIES_SEASONS";
const T_EDIT: &str = "SERIES_EDIT";
const T_DELETE: &str = "SERIES_DELETE";
const T_DELETE_YES: &str = "SERIES_DELETE_YES";
const T_DELETE_NO: &str = "SERIES_DELETE_NO";
const T_BACK: &str = "SERIES_BACK";
const T_EDIT_MONITOR: &str = "SERIESEDIT_MONITOR";
const T_EDIT_PROFILE: &str = "SERIESEDIT_PROFILE";
const T_EDIT_SUBMIT: &str = "SERIESEDIT_SUBMIT";
const T_EDIT_BACK: &str = "SERIESEDIT_BACK";
const P_EDIT_TAG: &str = "SERIESEDIT_TAG_";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SeriesToken {
    Monitor,
    Unmonitor,
    Search,
    MonitorSearch,
    Seasons,
    Edit,
    Delete,
    DeleteYes,
    DeleteNo,
    Back,
    Cancel,
    EditMonitor,
    EditProfile,
    EditTag(i64),
    EditSubmit,
    EditBack,
}

fn decode(token: &str) -> Option<SeriesToken> {
    match token {
        T_MONITOR => return Some(SeriesToken::Monitor),
        T_UNMONITOR => return Some(SeriesToken::Unmonitor),
        T_SEARCH => return Some(SeriesToken::Search),
        T_MONITOR_SEARCH => return Some(SeriesToken::MonitorSearch),
        T_SEASONS => return Some(SeriesToken::Seasons),
        T_EDIT => return Some(SeriesToken::Edit),
        T_DELETE => return Some(SeriesToken::Delete),
        T_DELETE_YES => return Some(SeriesToken::DeleteYes),
        T_DELETE_NO => return Some(SeriesToken::DeleteNo),
        T_BACK => return Some(SeriesToken::Back),
        super::library::T_CANCEL => return Some(SeriesToken::Cancel),
        T_EDIT_MONITOR => return Some(SeriesToken::EditMonitor),
        T_EDIT_PROFILE => return Some(SeriesToken::EditProfile),
        T_EDIT_SUBMIT => return Some(SeriesToken::EditSubmit),
        T_EDIT_BACK => return Some(SeriesToken::EditBack),
        _ => {}
    }
    token
        .strip_prefix(P_EDIT_TAG)
        .and_then(|rest| rest.parse().ok())
        .map(SeriesToken::EditTag)
}

/// Everything the series and season screens need, fetched fresh when the
/// series is opened. The `pending_*` fields are the edit sub-wizard's
/// local accumulator; nothing is written until Submit.
#[derive(Debug, Clone, Default)]
pub struct SeriesDetail {
    pub series: Series,
    pub files: Vec<EpisodeFile>,
    pub episodes: Vec<Episode>,
    pub profiles: Vec<QualityProfile>,
    pub tags: Vec<Tag>,
    pub editing: bool,
    pub confirming_delete: bool,
    pub confirming_file_delete: bool,
    pub pending_monitored: bool,
    pub pending_profile_id: i64,
    pub pending_tags: BTreeSet<i64>,
}

impl SeriesDetail {
    /// Reset the pending edits to the current server state.
    pub fn reset_pending(&mut self) {
        self.pending_monitored = self.series.monitored;
        self.pending_profile_id = self.series.quality_profile_id;
        self.pending_tags = self.series.tags.iter().copied().collect();
    }

    pub fn profile_name(&self, id: i64) -> String {
        self.profiles
            .iter()
            .find(|profile| profile.id == id)
            .map(|profile| profile.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    }

    fn tag_labels(&self, ids: &[i64]) -> String {
        let labels: Vec<&str> = self
            .tags
            .iter()
            .filter(|tag| ids.contains(&tag.id))
            .map(|tag| tag.label.as_str())
            .collect();
        if labels.is_empty() {
            "none".to_string()
        } else {
            labels.join(", ")
        }
    }
}

impl Bot {
    /// Fetch a fresh snapshot of one series and show its screen.
    pub(crate) async fn open_series_detail(
        &self,
        chat_id: i64,
        mut session: LibrarySession,
        series_id: i64,
    ) -> Result<()> {
        let series = match self.server.series(series_id).await {
            Ok(series) => series,
            Err(err) => return self.surface_at(session.message, err).await,
        };
        let files = match self.server.episode_files(series_id).await {
            Ok(files) => files,
            Err(err) => return self.surface_at(session.message, err).await,
        };
        let episodes = match self.server.episodes(series_id).await {
            Ok(episodes) => episodes,
            Err(err) => return self.surface_at(session.message, err).await,
        };
        let profiles = match self.server.quality_profiles().await {
            Ok(profiles) => profiles,
            Err(err) => return self.surface_at(session.message, err).await,
        };
        let tags = match self.server.tags().await {
            Ok(tags) => tags,
            Err(err) => return self.surface_at(session.message, err).await,
        };

        let mut detail = SeriesDetail {
            series,
            files,
            episodes,
            profiles,
            tags,
            ..Default::default()
        };
        detail.reset_pending();
        session.detail = Some(detail);
        session.season_number = None;

        self.sessions
            .set_active(chat_id, ActiveWizard::Library(LibraryMode::SeriesEdit));
        self.sessions.set_library_session(chat_id, session.clone());
        self.render_series_screen(&session).await
    }

    pub(crate) async fn on_series_callback(&self, chat_id: i64, token: &str) -> Result<()> {
        let Some(mut session) = self.sessions.library_session(chat_id) else {
            return self.reject_unrecognized(chat_id).await;
        };
        let Some(token) = decode(token) else {
            return self.reject_unrecognized(chat_id).await;
        };
        let Some(mut detail) = session.detail.clone() else {
            return self.reject_unrecognized(chat_id).await;
        };

        match token {
            SeriesToken::Cancel => self.cancel_library(chat_id, &session).await,
            SeriesToken::Monitor => self.set_series_monitored(chat_id, session, true).await,
            SeriesToken::Unmonitor => self.set_series_monitored(chat_id, session, false).await,
            SeriesToken::Search => {
                let command = CommandRequest::series_search(detail.series.id);
                if let Err(err) = self.server.send_command(&command).await {
                    return self.surface_at(session.message, err).await;
                }
                session.series_last_search = Some(Utc::now());
                self.store_and_render_series(chat_id, session).await
            }
            SeriesToken::MonitorSearch => {
                // Two sequential writes; a search failure after a
                // successful monitor flip leaves the flip in place.
                self.set_series_monitored(chat_id, session.clone(), true)
                    .await?;
                let Some(session) = self.sessions.library_session(chat_id) else {
                    return Ok(());
                };
                let Some(detail) = session.detail.clone() else {
                    return Ok(());
                };
                if !detail.series.monitored {
                    return Ok(());
                }
                let command = CommandRequest::series_search(detail.series.id);
                if let Err(err) = self.server.send_command(&command).await {
                    return self.surface_at(session.message, err).await;
                }
                let mut session = session;
                session.series_last_search = Some(Utc::now());
                self.store_and_render_series(chat_id, session).await
            }
            SeriesToken::Seasons => {
                session.season_number = None;
                self.sessions
                    .set_active(chat_id, ActiveWizard::Library(LibraryMode::SeasonEdit));
                self.sessions.set_library_session(chat_id, session.clone());
                self.render_season_screen(&session).await
            }
            SeriesToken::Edit => {
                detail.editing = true;
                detail.reset_pending();
                session.detail = Some(detail);
                self.store_and_render_series(chat_id, session).await
            }
            SeriesToken::Delete => {
                detail.confirming_delete = true;
                session.detail = Some(detail);
                self.store_and_render_series(chat_id, session).await
            }
            SeriesToken::DeleteNo => {
                detail.confirming_delete = false;
                session.detail = Some(detail);
                self.store_and_render_series(chat_id, session).await
            }
            SeriesToken::DeleteYes => {
                if let Err(err) = self.server.delete_series(detail.series.id, true).await {
                    return self.surface_at(session.message, err).await;
                }
                tracing::info!(series_id = detail.series.id, "deleted series");
                self.sessions.clear(chat_id);
                self.messenger
                    .edit_text(
                        session.message,
                        &format!("Deleted {} and all its files", detail.series.title),
                    )
                    .await?;
                Ok(())
            }
            SeriesToken::Back => {
                let mode = if session.filtered.is_empty() {
                    LibraryMode::Menu
                } else {
                    LibraryMode::Browse
                };
                session.detail = None;
                self.sessions
                    .set_active(chat_id, ActiveWizard::Library(mode));
                self.sessions.set_library_session(chat_id, session.clone());
                match mode {
                    LibraryMode::Menu => self.render_library_menu(&session).await,
                    _ => self.render_library_browse(&session).await,
                }
            }
            SeriesToken::EditMonitor => {
                detail.pending_monitored = !detail.pending_monitored;
                session.detail = Some(detail);
                self.store_and_render_series(chat_id, session).await
            }
            SeriesToken::EditProfile => {
                // Cycle through the configured profiles in order.
                let position = detail
                    .profiles
                    .iter()
                    .position(|p| p.id == detail.pending_profile_id)
                    .unwrap_or(0);
                if let Some(next) = detail.profiles.get((position + 1) % detail.profiles.len().max(1)) {
                    detail.pending_profile_id = next.id;
                }
                session.detail = Some(detail);
                self.store_and_render_series(chat_id, session).await
            }
            SeriesToken::EditTag(id) => {
                if !detail.tags.iter().any(|t| t.id == id) {
                    return self.reject_unrecognized(chat_id).await;
                }
                if !detail.pending_tags.remove(&id) {
                    detail.pending_tags.insert(id);
                }
                session.detail = Some(detail);
                self.store_and_render_series(chat_id, session).await
            }
            SeriesToken::EditSubmit => {
                let mut updated = detail.series.clone();
                updated.monitored = detail.pending_monitored;
                updated.quality_profile_id = detail.pending_profile_id;
                updated.tags = detail.pending_tags.iter().copied().collect();
                match self.server.update_series(&updated).await {
                    Ok(series) => {
                        detail.series = series;
                        detail.editing = false;
                        detail.reset_pending();
                        session.detail = Some(detail);
                        self.store_and_render_series(chat_id, session).await
                    }
                    Err(err) => self.surface_at(session.message, err).await,
                }
            }
            SeriesToken::EditBack => {
                detail.editing = false;
                detail.reset_pending();
                session.detail = Some(detail);
                self.store_and_render_series(chat_id, session).await
            }
        }
    }

    /// Write-through monitored flip, then re-render from the server's
    /// answer.
    async fn set_series_monitored(
        &self,
        chat_id: i64,
        mut session: LibrarySession,
        monitored: bool,
    ) -> Result<()> {
        let Some(mut detail) = session.detail.clone() else {
            return self.reject_unrecognized(chat_id).await;
        };
        let mut updated = detail.series.clone();
        updated.monitored = monitored;
        match self.server.update_series(&updated).await {
            Ok(series) => {
                detail.series = series;
                detail.reset_pending();
                session.detail = Some(detail);
                self.store_and_render_series(chat_id, session).await
            }
            Err(err) => self.surface_at(session.message, err).await,
        }
    }

    async fn store_and_render_series(&self, chat_id: i64, session: LibrarySession) -> Result<()> {
        self.sessions.set_library_session(chat_id, session.clone());
        self.render_series_screen(&session).await
    }

    pub(crate) async fn render_series_screen(&self, session: &LibrarySession) -> Result<()> {
        let Some(detail) = &session.detail else {
            return Ok(());
        };
        let (text, keyboard, link_preview) = if detail.confirming_delete {
            render_delete_confirm(detail)
        } else if detail.editing {
            render_edit(detail)
        } else {
            render_detail(session, detail)
        };
        self.messenger
            .edit_markup(session.message, &text, keyboard, link_preview)
            .await
    }
}

fn render_detail(session: &LibrarySession, detail: &SeriesDetail) -> (String, Keyboard, bool) {
    let series = &detail.series;
    let mut text = format::imdb_line(series);
    text.push_str(&format!("Status: {}\n", format::escape(&series.status)));
    text.push_str(&format!("Type: {}\n", format::escape(&series.series_type)));
    text.push_str(&format!(
        "Profile: {}\n",
        format::escape(&detail.profile_name(series.quality_profile_id))
    ));
    text.push_str(&format!(
        "Tags: {}\n",
        format::escape(&detail.tag_labels(&series.tags))
    ));
    text.push_str(&format!(
        "Size on disk: {} GiB\n",
        format::gibibytes(series.size_on_disk())
    ));
    text.push_str(&format!(
        "Monitored: {}\n",
        kb::monitor_icon(series.monitored)
    ));
    if let Some(at) = session.series_last_search {
        text.push_str(&format!(
            "Last search: {}\n",
            format::escape(&at.format("%Y-%m-%d %H:%M UTC").to_string())
        ));
    }

    let mut keyboard = Keyboard::new();
    if series.monitored {
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
    keyboard.push_button(Button::new("Seasons", T_SEASONS));
    keyboard.push_button(Button::new("Edit", T_EDIT));
    keyboard.push_button(Button::new("Delete", T_DELETE));
    keyboard.push_row(kb::back_row(T_BACK));
    keyboard.push_button(Button::new("Cancel", super::library::T_CANCEL));
    (text, keyboard, true)
}

fn render_delete_confirm(detail: &SeriesDetail) -> (String, Keyboard, bool) {
    let text = format!(
        "Delete *{}* and all its files?",
        format::escape(&detail.series.title)
    );
    let keyboard = Keyboard::stacked(&[("Yes, delete", T_DELETE_YES), ("No", T_DELETE_NO)]);
    (text, keyboard, false)
}

fn render_edit(detail: &SeriesDetail) -> (String, Keyboard, bool) {
    let text = format!(
        "*Edit {}*\n\nChanges are applied on Submit\\.",
        format::escape(&detail.series.title)
    );
    let mut keyboard = Keyboard::new();
    keyboard.push_button(Button::new(
        format!("Monitored: {}", kb::monitor_icon(detail.pending_monitored)),
        T_EDIT_MONITOR,
    ));
    keyboard.push_button(Button::new(
        format!("Profile: {}", detail.profile_name(detail.pending_profile_id)),
        T_EDIT_PROFILE,
    ));
    for tag in &detail.tags {
        let selected = detail.pending_tags.contains(&tag.id);
        let label = if selected {
            format!("{} {}", tag.label, kb::CHECK)
        } else {
            tag.label.clone()
        };
        keyboard.push_button(Button::new(label, format!("{}{}", P_EDIT_TAG, tag.id)));
    }
    keyboard.push_button(Button::new("Submit", T_EDIT_SUBMIT));
    keyboard.push_row(kb::back_row(T_EDIT_BACK));
    (text, keyboard, false)
}
