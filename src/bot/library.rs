//! Library wizard entry: the filter menu and the paged browse view.
//! Series and season screens live in the sibling modules and share the
//! same [`LibrarySession`].

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::format;
use crate::sonarr::Series;
use crate::transport::{Button, Keyboard, MessageRef};

use super::keyboard as kb;
use super::paging::{self, LibraryFilter};
use super::series::SeriesDetail;
use super::session::{ActiveWizard, LibraryMode};
use super::{Bot, MSG_COMMANDS_CLEARED, MSG_NO_RESULTS};

pub(crate) const T_CANCEL: &str = "LIBRARY_CANCEL";
const T_MENU: &str = "LIBRARY_MENU";
const T_MONITORED: &str = "LIBRARY_MONITORED";
const T_UNMONITORED: &str = "LIBRARY_UNMONITORED";
const T_CONTINUING: &str = "LIBRARY_CONTINUING";
const T_ENDED: &str = "LIBRARY_ENDED";
const T_ONDISK: &str = "LIBRARY_ONDISK";
const T_MISSING: &str = "LIBRARY_MISSING";
const T_ALL: &str = "LIBRARY_ALL";
const P_TVDBID: &str = "LIBRARY_TVDBID_";

/// Shared state of the whole library wizard, including the series and
/// season screens.
#[derive(Debug, Clone, Default)]
pub struct LibrarySession {
    pub message: MessageRef,
    /// Full library snapshot, sorted title-ascending ignoring articles.
    pub all: Vec<Series>,
    pub filter: Option<LibraryFilter>,
    /// TVDB ids of the current filtered view.
    pub filtered: Vec<i64>,
    pub page: usize,
    /// Loaded when a series screen is open.
    pub detail: Option<SeriesDetail>,
    /// Season currently shown on the season screen, `None` on the list.
    pub season_number: Option<i32>,
    pub series_last_search: Option<DateTime<Utc>>,
    pub season_last_search: HashMap<i32, DateTime<Utc>>,
}

impl LibrarySession {
    /// Switching the filter always recomputes the view and resets paging
    /// in the same step; a stale page index can never survive a filter
    /// change.
    pub fn set_filter(&mut self, filter: LibraryFilter) {
        self.filter = Some(filter);
        self.filtered = self
            .all
            .iter()
            .filter(|series| filter.matches(series))
            .map(|series| series.tvdb_id)
            .collect();
        self.page = 0;
    }

    pub fn series_by_tvdb(&self, tvdb_id: i64) -> Option<&Series> {
        self.all.iter().find(|series| series.tvdb_id == tvdb_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuToken {
    Filter(LibraryFilter),
    Cancel,
}

fn decode_menu(token: &str) -> Option<MenuToken> {
    let filter = match token {
        T_CANCEL => return Some(MenuToken::Cancel),
        T_MONITORED => LibraryFilter::Monitored,
        T_UNMONITORED => LibraryFilter::Unmonitored,
        T_CONTINUING => LibraryFilter::Continuing,
        T_ENDED => LibraryFilter::Ended,
        T_ONDISK => LibraryFilter::OnDisk,
        T_MISSING => LibraryFilter::MissingEpisodes,
        T_ALL => LibraryFilter::All,
        _ => return None,
    };
    Some(MenuToken::Filter(filter))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseToken {
    Pick(i64),
    Menu,
    Cancel,
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    CurrentPage,
}

fn decode_browse(token: &str) -> Option<BrowseToken> {
    match token {
        T_MENU => return Some(BrowseToken::Menu),
        T_CANCEL => return Some(BrowseToken::Cancel),
        kb::TOKEN_FIRST_PAGE => return Some(BrowseToken::FirstPage),
        kb::TOKEN_PREVIOUS_PAGE => return Some(BrowseToken::PreviousPage),
        kb::TOKEN_NEXT_PAGE => return Some(BrowseToken::NextPage),
        kb::TOKEN_LAST_PAGE => return Some(BrowseToken::LastPage),
        kb::TOKEN_CURRENT_PAGE => return Some(BrowseToken::CurrentPage),
        _ => {}
    }
    token
        .strip_prefix(P_TVDBID)
        .and_then(|rest| rest.parse().ok())
        .map(BrowseToken::Pick)
}

impl Bot {
    pub(crate) async fn start_library(&self, chat_id: i64, query: &str) -> Result<()> {
        let message = self
            .messenger
            .send_text(chat_id, "Loading library, please wait...")
            .await?;
        let mut library = match self.server.all_series().await {
            Ok(library) => library,
            Err(err) => return self.surface_at(message, err).await,
        };
        if library.is_empty() {
            self.messenger
                .edit_text(message, "The library is empty")
                .await?;
            return Ok(());
        }
        library.sort_by_key(|series| format::sort_key(&series.title));

        let mut session = LibrarySession {
            message,
            all: library,
            ..Default::default()
        };

        if !query.is_empty() {
            let needle = query.to_lowercase();
            let matches: Vec<i64> = session
                .all
                .iter()
                .filter(|series| series.title.to_lowercase().contains(&needle))
                .map(|series| series.tvdb_id)
                .collect();
            if matches.is_empty() {
                self.messenger.edit_text(message, MSG_NO_RESULTS).await?;
                return Ok(());
            }
            session.filtered = matches;
            if session.filtered.len() == 1 {
                // One hit: straight to the series screen.
                let tvdb_id = session.filtered[0];
                let Some(series_id) = session.series_by_tvdb(tvdb_id).map(|s| s.id) else {
                    return self.reject_unrecognized(chat_id).await;
                };
                return self.open_series_detail(chat_id, session, series_id).await;
            }
            self.sessions
                .set_active(chat_id, ActiveWizard::Library(LibraryMode::Browse));
            self.sessions.set_library_session(chat_id, session.clone());
            return self.render_library_browse(&session).await;
        }

        self.sessions
            .set_active(chat_id, ActiveWizard::Library(LibraryMode::Menu));
        self.sessions.set_library_session(chat_id, session.clone());
        self.render_library_menu(&session).await
    }

    pub(crate) async fn on_library_callback(
        &self,
        chat_id: i64,
        mode: LibraryMode,
        token: &str,
    ) -> Result<()> {
        match mode {
            LibraryMode::Menu => self.on_library_menu(chat_id, token).await,
            LibraryMode::Browse => self.on_library_browse(chat_id, token).await,
            LibraryMode::SeriesEdit => self.on_series_callback(chat_id, token).await,
            LibraryMode::SeasonEdit => self.on_season_callback(chat_id, token).await,
        }
    }

    async fn on_library_menu(&self, chat_id: i64, token: &str) -> Result<()> {
        let Some(mut session) = self.sessions.library_session(chat_id) else {
            return self.reject_unrecognized(chat_id).await;
        };
        let Some(token) = decode_menu(token) else {
            return self.reject_unrecognized(chat_id).await;
        };
        match token {
            MenuToken::Cancel => self.cancel_library(chat_id, &session).await,
            MenuToken::Filter(filter) => {
                session.set_filter(filter);
                self.sessions
                    .set_active(chat_id, ActiveWizard::Library(LibraryMode::Browse));
                self.sessions.set_library_session(chat_id, session.clone());
                self.render_library_browse(&session).await
            }
        }
    }

    async fn on_library_browse(&self, chat_id: i64, token: &str) -> Result<()> {
        let Some(mut session) = self.sessions.library_session(chat_id) else {
            return self.reject_unrecognized(chat_id).await;
        };
        let Some(token) = decode_browse(token) else {
            return self.reject_unrecognized(chat_id).await;
        };
        match token {
            BrowseToken::Cancel => self.cancel_library(chat_id, &session).await,
            BrowseToken::CurrentPage => Ok(()),
            BrowseToken::Menu => {
                self.sessions
                    .set_active(chat_id, ActiveWizard::Library(LibraryMode::Menu));
                self.sessions.set_library_session(chat_id, session.clone());
                self.render_library_menu(&session).await
            }
            BrowseToken::FirstPage => {
                session.page = 0;
                self.store_and_render_browse(chat_id, session).await
            }
            BrowseToken::PreviousPage => {
                session.page = session.page.saturating_sub(1);
                self.store_and_render_browse(chat_id, session).await
            }
            BrowseToken::NextPage => {
                let last = paging::last_page(session.filtered.len(), self.config.page_size);
                session.page = (session.page + 1).min(last);
                self.store_and_render_browse(chat_id, session).await
            }
            BrowseToken::LastPage => {
                session.page = paging::last_page(session.filtered.len(), self.config.page_size);
                self.store_and_render_browse(chat_id, session).await
            }
            BrowseToken::Pick(tvdb_id) => {
                let Some(series_id) = session.series_by_tvdb(tvdb_id).map(|s| s.id) else {
                    return self.reject_unrecognized(chat_id).await;
                };
                self.open_series_detail(chat_id, session, series_id).await
            }
        }
    }

    pub(crate) async fn cancel_library(
        &self,
        chat_id: i64,
        session: &LibrarySession,
    ) -> Result<()> {
        self.sessions.clear(chat_id);
        self.messenger
            .edit_text(session.message, MSG_COMMANDS_CLEARED)
            .await?;
        Ok(())
    }

    async fn store_and_render_browse(&self, chat_id: i64, session: LibrarySession) -> Result<()> {
        self.sessions.set_library_session(chat_id, session.clone());
        self.render_library_browse(&session).await
    }

    pub(crate) async fn render_library_menu(&self, session: &LibrarySession) -> Result<()> {
        let text = format!("*Library* \\({} series\\)\n\nPick a view:", session.all.len());
        let keyboard = Keyboard::stacked(&[
            ("Monitored", T_MONITORED),
            ("Unmonitored", T_UNMONITORED),
            ("Continuing", T_CONTINUING),
            ("Ended", T_ENDED),
            ("On disk", T_ONDISK),
            ("Missing episodes", T_MISSING),
            ("Show all", T_ALL),
            ("Cancel", T_CANCEL),
        ]);
        self.messenger
            .edit_markup(session.message, &text, keyboard, false)
            .await
    }

    pub(crate) async fn render_library_browse(&self, session: &LibrarySession) -> Result<()> {
        let heading = session
            .filter
            .map(LibraryFilter::heading)
            .unwrap_or("Search results");

        if session.filtered.is_empty() {
            let text = format!("*{}*\n\nNothing here\\.", format::escape(heading));
            let mut keyboard = Keyboard::new();
            keyboard.push_row(kb::back_row(T_MENU));
            keyboard.push_button(Button::new("Cancel", T_CANCEL));
            return self
                .messenger
                .edit_markup(session.message, &text, keyboard, false)
                .await;
        }

        let page = paging::page(session.filtered.len(), session.page, self.config.page_size);
        let window: Vec<&Series> = session.filtered[page.start..page.end]
            .iter()
            .filter_map(|tvdb_id| session.series_by_tvdb(*tvdb_id))
            .collect();

        let text = format!(
            "*{}* \\({}\\)",
            format::escape(heading),
            session.filtered.len()
        );
        let mut keyboard = kb::series_rows(&window, P_TVDBID, |_| false);
        keyboard.push_row(kb::pagination_row(page.index, page.last));
        keyboard.push_row(kb::back_row(T_MENU));
        keyboard.push_button(Button::new("Cancel", T_CANCEL));
        self.messenger
            .edit_markup(session.message, &text, keyboard, false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(title: &str, tvdb_id: i64, monitored: bool) -> Series {
        Series {
            title: title.to_string(),
            tvdb_id,
            monitored,
            ..Default::default()
        }
    }

    #[test]
    fn set_filter_resets_the_page() {
        let mut session = LibrarySession {
            all: vec![
                series("Dark", 1, true),
                series("Fargo", 2, false),
                series("Severance", 3, true),
            ],
            page: 4,
            ..Default::default()
        };
        session.set_filter(LibraryFilter::Monitored);
        assert_eq!(session.page, 0);
        assert_eq!(session.filtered, vec![1, 3]);

        session.page = 2;
        session.set_filter(LibraryFilter::Unmonitored);
        assert_eq!(session.page, 0);
        assert_eq!(session.filtered, vec![2]);
    }

    #[test]
    fn menu_tokens_cover_every_filter() {
        assert_eq!(
            decode_menu(T_MISSING),
            Some(MenuToken::Filter(LibraryFilter::MissingEpisodes))
        );
        assert_eq!(decode_menu(T_ALL), Some(MenuToken::Filter(LibraryFilter::All)));
        assert_eq!(decode_menu("LIBRARY_BOGUS"), None);
    }

    #[test]
    fn browse_pick_decodes_after_exact_tokens() {
        assert_eq!(decode_browse("LIBRARY_MENU"), Some(BrowseToken::Menu));
        assert_eq!(decode_browse("LIBRARY_TVDBID_9"), Some(BrowseToken::Pick(9)));
        assert_eq!(decode_browse("LIBRARY_TVDBID_x"), None);
    }
}
