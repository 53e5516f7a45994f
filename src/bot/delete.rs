//! Delete-series wizard: a paged multi-select over the library followed by
//! a confirmation list. Deletions run sequentially and stop at the first
//! failure so the user can see exactly what happened.

use std::collections::BTreeSet;

use anyhow::Result;

use crate::format;
use crate::sonarr::Series;
use crate::transport::{Button, Keyboard, MessageRef};

use super::keyboard as kb;
use super::paging;
use super::session::ActiveWizard;
use super::{Bot, MSG_COMMANDS_CLEARED, MSG_NO_RESULTS};

const T_SUBMIT: &str = "DELETE_SUBMIT";
const T_YES: &str = "DELETE_YES";
const T_BACK: &str = "DELETE_BACK";
const T_CANCEL: &str = "DELETE_CANCEL";
const P_TVDBID: &str = "DELETE_TVDBID_";

#[derive(Debug, Clone, PartialEq, Eq)]
enum DeleteToken {
    Toggle(i64),
    Submit,
    Confirm,
    Back,
    Cancel,
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    CurrentPage,
}

fn decode(token: &str) -> Option<DeleteToken> {
    match token {
        T_SUBMIT => return Some(DeleteToken::Submit),
        T_YES => return Some(DeleteToken::Confirm),
        T_BACK => return Some(DeleteToken::Back),
        T_CANCEL => return Some(DeleteToken::Cancel),
        kb::TOKEN_FIRST_PAGE => return Some(DeleteToken::FirstPage),
        kb::TOKEN_PREVIOUS_PAGE => return Some(DeleteToken::PreviousPage),
        kb::TOKEN_NEXT_PAGE => return Some(DeleteToken::NextPage),
        kb::TOKEN_LAST_PAGE => return Some(DeleteToken::LastPage),
        kb::TOKEN_CURRENT_PAGE => return Some(DeleteToken::CurrentPage),
        _ => {}
    }
    token
        .strip_prefix(P_TVDBID)
        .and_then(|rest| rest.parse().ok())
        .map(DeleteToken::Toggle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteStep {
    #[default]
    Selection,
    ConfirmList,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteSeriesSession {
    pub message: MessageRef,
    pub step: DeleteStep,
    /// Candidate series, sorted title-ascending ignoring leading articles.
    pub matches: Vec<Series>,
    /// TVDB ids the user has ticked. A set, so toggling is idempotent.
    pub selected: BTreeSet<i64>,
    pub page: usize,
}

impl Bot {
    pub(crate) async fn start_delete_series(&self, chat_id: i64, query: &str) -> Result<()> {
        let message = self
            .messenger
            .send_text(chat_id, "Loading library, please wait...")
            .await?;
        let mut library = match self.server.all_series().await {
            Ok(library) => library,
            Err(err) => return self.surface_at(message, err).await,
        };
        library.sort_by_key(|series| format::sort_key(&series.title));

        let mut session = DeleteSeriesSession {
            message,
            matches: library,
            ..Default::default()
        };
        if !query.is_empty() {
            let needle = query.to_lowercase();
            session
                .matches
                .retain(|series| series.title.to_lowercase().contains(&needle));
            if session.matches.is_empty() {
                self.messenger.edit_text(message, MSG_NO_RESULTS).await?;
                return Ok(());
            }
            // A query with a single hit needs no picker.
            if session.matches.len() == 1 {
                session.selected.insert(session.matches[0].tvdb_id);
                session.step = DeleteStep::ConfirmList;
            }
        }
        if session.matches.is_empty() {
            self.messenger
                .edit_text(message, "The library is empty")
                .await?;
            return Ok(());
        }

        self.sessions.set_active(chat_id, ActiveWizard::Delete);
        self.sessions.set_delete_session(chat_id, session.clone());
        self.render_delete_step(&session).await
    }

    pub(crate) async fn on_delete_callback(&self, chat_id: i64, token: &str) -> Result<()> {
        let Some(mut session) = self.sessions.delete_session(chat_id) else {
            return self.reject_unrecognized(chat_id).await;
        };
        let Some(token) = decode(token) else {
            return self.reject_unrecognized(chat_id).await;
        };

        match token {
            DeleteToken::Cancel => {
                self.sessions.clear(chat_id);
                self.messenger
                    .edit_text(session.message, MSG_COMMANDS_CLEARED)
                    .await?;
                Ok(())
            }
            DeleteToken::CurrentPage => Ok(()),
            DeleteToken::Toggle(tvdb_id) => {
                if !session.matches.iter().any(|s| s.tvdb_id == tvdb_id) {
                    return self.reject_unrecognized(chat_id).await;
                }
                if !session.selected.remove(&tvdb_id) {
                    session.selected.insert(tvdb_id);
                }
                self.store_and_render_delete(chat_id, session).await
            }
            DeleteToken::FirstPage => {
                session.page = 0;
                self.store_and_render_delete(chat_id, session).await
            }
            DeleteToken::PreviousPage => {
                session.page = session.page.saturating_sub(1);
                self.store_and_render_delete(chat_id, session).await
            }
            DeleteToken::NextPage => {
                let last = paging::last_page(session.matches.len(), self.config.page_size);
                session.page = (session.page + 1).min(last);
                self.store_and_render_delete(chat_id, session).await
            }
            DeleteToken::LastPage => {
                session.page = paging::last_page(session.matches.len(), self.config.page_size);
                self.store_and_render_delete(chat_id, session).await
            }
            DeleteToken::Submit => {
                if session.selected.is_empty() {
                    // Nothing ticked; stay on the picker.
                    return self.store_and_render_delete(chat_id, session).await;
                }
                session.step = DeleteStep::ConfirmList;
                self.store_and_render_delete(chat_id, session).await
            }
            DeleteToken::Back => {
                session.step = DeleteStep::Selection;
                self.store_and_render_delete(chat_id, session).await
            }
            DeleteToken::Confirm => self.on_delete_confirmed(chat_id, session).await,
        }
    }

    /// One delete-with-files call per ticked series, in TVDB-id order.
    /// The first failure aborts the loop with state kept; series removed
    /// before it stay removed and are dropped from the selection, so a
    /// retry only covers the remainder.
    async fn on_delete_confirmed(
        &self,
        chat_id: i64,
        mut session: DeleteSeriesSession,
    ) -> Result<()> {
        let mut deleted = 0usize;
        for tvdb_id in session.selected.clone() {
            let Some(series) = session.matches.iter().find(|s| s.tvdb_id == tvdb_id).cloned()
            else {
                continue;
            };
            if let Err(err) = self.server.delete_series(series.id, true).await {
                self.sessions.set_delete_session(chat_id, session.clone());
                return self.surface_at(session.message, err).await;
            }
            tracing::info!(series_id = series.id, title = %series.title, "deleted series");
            session.selected.remove(&tvdb_id);
            session.matches.retain(|s| s.tvdb_id != tvdb_id);
            deleted += 1;
        }
        self.sessions.clear(chat_id);
        self.messenger
            .edit_text(
                session.message,
                &format!("Deleted {} series with all files", deleted),
            )
            .await?;
        Ok(())
    }

    async fn store_and_render_delete(
        &self,
        chat_id: i64,
        session: DeleteSeriesSession,
    ) -> Result<()> {
        self.sessions.set_delete_session(chat_id, session.clone());
        self.render_delete_step(&session).await
    }

    async fn render_delete_step(&self, session: &DeleteSeriesSession) -> Result<()> {
        let (text, keyboard) = match session.step {
            DeleteStep::Selection => self.render_delete_selection(session),
            DeleteStep::ConfirmList => render_delete_confirm(session),
        };
        self.messenger
            .edit_markup(session.message, &text, keyboard, false)
            .await
    }

    fn render_delete_selection(&self, session: &DeleteSeriesSession) -> (String, Keyboard) {
        let page = paging::page(session.matches.len(), session.page, self.config.page_size);
        let window: Vec<&Series> = session.matches[page.start..page.end].iter().collect();

        let text = "Select the series to delete:".to_string();
        let mut keyboard = kb::series_rows(&window, P_TVDBID, |series| {
            session.selected.contains(&series.tvdb_id)
        });
        keyboard.push_row(kb::pagination_row(page.index, page.last));
        keyboard.push_row(vec![
            Button::new("Delete selected", T_SUBMIT),
            Button::new("Cancel", T_CANCEL),
        ]);
        (text, keyboard)
    }
}

fn render_delete_confirm(session: &DeleteSeriesSession) -> (String, Keyboard) {
    let mut text = "*Delete these series and all their files?*\n\n".to_string();
    for tvdb_id in &session.selected {
        if let Some(series) = session.matches.iter().find(|s| s.tvdb_id == *tvdb_id) {
            text.push_str(&format!(
                "{} \\- _{}_\n",
                format::escape(&series.title),
                series.year
            ));
        }
    }
    let mut keyboard = Keyboard::stacked(&[("Yes, delete", T_YES)]);
    keyboard.push_row(kb::back_row(T_BACK));
    keyboard.push_button(Button::new("Cancel", T_CANCEL));
    (text, keyboard)
}
