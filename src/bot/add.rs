//! Add-series wizard: search, confirm, then a chain of selection steps
//! ending in the create-series request. Steps with only one possible
//! answer are skipped and auto-selected; back-navigation recomputes the
//! same skips so it always lands on a step that was actually shown.

use std::collections::BTreeSet;

use anyhow::Result;

use crate::format;
use crate::sonarr::{AddSeriesInput, AddSeriesOptions, QualityProfile, RootFolder, Series, Tag};
use crate::transport::{Button, Keyboard, MessageRef};

use super::keyboard as kb;
use super::session::ActiveWizard;
use super::{Bot, MAX_SEARCH_RESULTS, MSG_COMMANDS_CLEARED, MSG_NO_RESULTS, MSG_TOO_MANY_RESULTS};

const T_YES: &str = "ADDSERIES_YES";
const T_CANCEL: &str = "ADDSERIES_CANCEL";
const T_BACK: &str = "ADDSERIES_BACK";
const T_TAG_DONE: &str = "ADDSERIES_TAG_DONE";
const T_ADD_PLAIN: &str = "ADDSERIES_ADD_PLAIN";
const T_ADD_MISSING: &str = "ADDSERIES_ADD_MISSING";
const T_ADD_MISSING_CUTOFF: &str = "ADDSERIES_ADD_MISSING_CUTOFF";
const T_ADD_CUTOFF: &str = "ADDSERIES_ADD_CUTOFF";
const P_TVDBID: &str = "ADDSERIES_TVDBID_";
const P_PROFILE: &str = "ADDSERIES_PROFILE_";
const P_FOLDER: &str = "ADDSERIES_FOLDER_";
const P_TAG: &str = "ADDSERIES_TAG_";
const P_TYPE: &str = "ADDSERIES_TYPE_";
const P_MONITOR: &str = "ADDSERIES_MONITOR_";

const SERIES_TYPES: [&str; 3] = ["standard", "daily", "anime"];

/// Sonarr monitor modes with their button labels, in display order.
const MONITOR_MODES: [(&str, &str); 8] = [
    ("all", "All Episodes"),
    ("future", "Future Episodes"),
    ("missing", "Missing Episodes"),
    ("existing", "Existing Episodes"),
    ("firstSeason", "First Season"),
    ("lastSeason", "Last Season"),
    ("pilot", "Pilot Episode"),
    ("none", "None"),
];

/// Decoded form of an add-wizard callback token. Exact matches are tried
/// before prefixes, so `ADDSERIES_TAG_DONE` can never parse as a tag id.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AddToken {
    Pick(i64),
    Confirm,
    Profile(i64),
    Folder(usize),
    Tag(i64),
    TagsDone,
    Type(String),
    Monitor(String),
    AddMode { missing: bool, cutoff: bool },
    Back,
    Cancel,
}

fn decode(token: &str) -> Option<AddToken> {
    match token {
        T_YES => return Some(AddToken::Confirm),
        T_CANCEL => return Some(AddToken::Cancel),
        T_BACK => return Some(AddToken::Back),
        T_TAG_DONE => return Some(AddToken::TagsDone),
        T_ADD_PLAIN => {
            return Some(AddToken::AddMode {
                missing: false,
                cutoff: false,
            })
        }
        T_ADD_MISSING => {
            return Some(AddToken::AddMode {
                missing: true,
                cutoff: false,
            })
        }
        T_ADD_MISSING_CUTOFF => {
            return Some(AddToken::AddMode {
                missing: true,
                cutoff: true,
            })
        }
        T_ADD_CUTOFF => {
            return Some(AddToken::AddMode {
                missing: false,
                cutoff: true,
            })
        }
        _ => {}
    }
    if let Some(rest) = token.strip_prefix(P_TVDBID) {
        return rest.parse().ok().map(AddToken::Pick);
    }
    if let Some(rest) = token.strip_prefix(P_PROFILE) {
        return rest.parse().ok().map(AddToken::Profile);
    }
    if let Some(rest) = token.strip_prefix(P_FOLDER) {
        return rest.parse().ok().map(AddToken::Folder);
    }
    if let Some(rest) = token.strip_prefix(P_MONITOR) {
        return Some(AddToken::Monitor(rest.to_string()));
    }
    if let Some(rest) = token.strip_prefix(P_TYPE) {
        return Some(AddToken::Type(rest.to_string()));
    }
    if let Some(rest) = token.strip_prefix(P_TAG) {
        return rest.parse().ok().map(AddToken::Tag);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddStep {
    #[default]
    SearchResults,
    Confirm,
    Profile,
    RootFolder,
    Tags,
    Type,
    Monitor,
    AddOptions,
}

const STEP_ORDER: [AddStep; 8] = [
    AddStep::SearchResults,
    AddStep::Confirm,
    AddStep::Profile,
    AddStep::RootFolder,
    AddStep::Tags,
    AddStep::Type,
    AddStep::Monitor,
    AddStep::AddOptions,
];

#[derive(Debug, Clone, Default)]
pub struct AddSeriesSession {
    pub message: MessageRef,
    pub step: AddStep,
    /// Lookup results, sorted by year ascending.
    pub results: Vec<Series>,
    pub chosen: Option<Series>,
    pub profiles: Vec<QualityProfile>,
    pub root_folders: Vec<RootFolder>,
    pub tags: Vec<Tag>,
    pub selected_tags: BTreeSet<i64>,
    pub profile_id: Option<i64>,
    pub root_folder_path: Option<String>,
    pub series_type: Option<String>,
    pub monitor: Option<String>,
}

impl AddSeriesSession {
    /// Whether a step has more than one possible answer and is therefore
    /// presented to the user at all.
    fn step_shown(&self, step: AddStep) -> bool {
        match step {
            AddStep::Profile => self.profiles.len() > 1,
            AddStep::RootFolder => self.root_folders.len() > 1,
            AddStep::Tags => !self.tags.is_empty(),
            _ => true,
        }
    }

    /// Move to the next shown step after `from`, auto-selecting the single
    /// answer of every step skipped on the way.
    pub fn advance(&mut self, from: AddStep) -> AddStep {
        let idx = STEP_ORDER.iter().position(|s| *s == from).unwrap_or(0);
        for &step in &STEP_ORDER[idx + 1..] {
            if self.step_shown(step) {
                self.step = step;
                return step;
            }
            self.auto_select(step);
        }
        self.step = AddStep::AddOptions;
        self.step
    }

    fn auto_select(&mut self, step: AddStep) {
        match step {
            AddStep::Profile => {
                if let Some(profile) = self.profiles.first() {
                    self.profile_id = Some(profile.id);
                }
            }
            AddStep::RootFolder => {
                if let Some(folder) = self.root_folders.first() {
                    self.root_folder_path = Some(folder.path.clone());
                }
            }
            _ => {}
        }
    }

    /// Nearest prior step that was actually shown. Confirm is never a back
    /// target: stepping back past the first selection returns to the search
    /// results.
    pub fn previous_step(&self, from: AddStep) -> AddStep {
        let idx = STEP_ORDER.iter().position(|s| *s == from).unwrap_or(0);
        for &step in STEP_ORDER[..idx].iter().rev() {
            if step == AddStep::Confirm {
                continue;
            }
            if self.step_shown(step) {
                return step;
            }
        }
        AddStep::SearchResults
    }

    fn heading(&self) -> String {
        match &self.chosen {
            Some(series) => format!("*{}*\n\n", format::escape(&series.title)),
            None => String::new(),
        }
    }
}

impl Bot {
    pub(crate) async fn start_add_series(&self, chat_id: i64, query: &str) -> Result<()> {
        if query.is_empty() {
            self.messenger
                .send_text(chat_id, "Usage: /q <series name>")
                .await?;
            return Ok(());
        }
        let message = self
            .messenger
            .send_text(chat_id, "Searching, please wait...")
            .await?;
        let mut results = match self.server.lookup(query).await {
            Ok(results) => results,
            Err(err) => return self.surface_at(message, err).await,
        };
        if results.is_empty() {
            self.messenger.edit_text(message, MSG_NO_RESULTS).await?;
            return Ok(());
        }
        if results.len() > MAX_SEARCH_RESULTS {
            self.messenger
                .edit_text(message, MSG_TOO_MANY_RESULTS)
                .await?;
            return Ok(());
        }
        results.sort_by_key(|series| series.year);

        let session = AddSeriesSession {
            message,
            results,
            ..Default::default()
        };
        self.sessions.set_active(chat_id, ActiveWizard::Add);
        self.sessions.set_add_session(chat_id, session.clone());
        self.render_add_step(&session).await
    }

    pub(crate) async fn on_add_callback(&self, chat_id: i64, token: &str) -> Result<()> {
        let Some(mut session) = self.sessions.add_session(chat_id) else {
            return self.reject_unrecognized(chat_id).await;
        };
        let Some(token) = decode(token) else {
            return self.reject_unrecognized(chat_id).await;
        };

        match token {
            AddToken::Cancel => {
                self.sessions.clear(chat_id);
                self.messenger
                    .edit_text(session.message, MSG_COMMANDS_CLEARED)
                    .await?;
                Ok(())
            }
            AddToken::Pick(tvdb_id) => {
                let Some(series) = session
                    .results
                    .iter()
                    .find(|s| s.tvdb_id == tvdb_id)
                    .cloned()
                else {
                    return self.reject_unrecognized(chat_id).await;
                };
                session.chosen = Some(series);
                session.step = AddStep::Confirm;
                self.store_and_render_add(chat_id, session).await
            }
            AddToken::Confirm => self.on_add_confirmed(chat_id, session).await,
            AddToken::Profile(id) => {
                if !session.profiles.iter().any(|p| p.id == id) {
                    return self.reject_unrecognized(chat_id).await;
                }
                session.profile_id = Some(id);
                session.advance(AddStep::Profile);
                self.store_and_render_add(chat_id, session).await
            }
            AddToken::Folder(index) => {
                let Some(folder) = session.root_folders.get(index) else {
                    return self.reject_unrecognized(chat_id).await;
                };
                session.root_folder_path = Some(folder.path.clone());
                session.advance(AddStep::RootFolder);
                self.store_and_render_add(chat_id, session).await
            }
            AddToken::Tag(id) => {
                if !session.tags.iter().any(|t| t.id == id) {
                    return self.reject_unrecognized(chat_id).await;
                }
                // Toggle; the step is re-rendered with updated checkmarks.
                if !session.selected_tags.remove(&id) {
                    session.selected_tags.insert(id);
                }
                self.store_and_render_add(chat_id, session).await
            }
            AddToken::TagsDone => {
                session.advance(AddStep::Tags);
                self.store_and_render_add(chat_id, session).await
            }
            AddToken::Type(series_type) => {
                if !SERIES_TYPES.contains(&series_type.as_str()) {
                    return self.reject_unrecognized(chat_id).await;
                }
                session.series_type = Some(series_type);
                session.advance(AddStep::Type);
                self.store_and_render_add(chat_id, session).await
            }
            AddToken::Monitor(monitor) => {
                if !MONITOR_MODES.iter().any(|(mode, _)| *mode == monitor) {
                    return self.reject_unrecognized(chat_id).await;
                }
                session.monitor = Some(monitor);
                session.advance(AddStep::Monitor);
                self.store_and_render_add(chat_id, session).await
            }
            AddToken::AddMode { missing, cutoff } => {
                self.on_add_submit(chat_id, session, missing, cutoff).await
            }
            AddToken::Back => {
                session.step = session.previous_step(session.step);
                self.store_and_render_add(chat_id, session).await
            }
        }
    }

    /// Confirm pressed: bail out if the series already exists, otherwise
    /// fetch the selection inputs once and advance into the step chain.
    async fn on_add_confirmed(&self, chat_id: i64, mut session: AddSeriesSession) -> Result<()> {
        let Some(chosen) = session.chosen.clone() else {
            return self.reject_unrecognized(chat_id).await;
        };
        if chosen.in_library() {
            self.sessions.clear(chat_id);
            self.messenger
                .edit_text(session.message, "Series already in library")
                .await?;
            return Ok(());
        }

        let profiles = match self.server.quality_profiles().await {
            Ok(profiles) => profiles,
            Err(err) => return self.surface_at(session.message, err).await,
        };
        let root_folders = match self.server.root_folders().await {
            Ok(folders) => folders,
            Err(err) => return self.surface_at(session.message, err).await,
        };
        let tags = match self.server.tags().await {
            Ok(tags) => tags,
            Err(err) => return self.surface_at(session.message, err).await,
        };
        if profiles.is_empty() {
            self.sessions.clear(chat_id);
            self.messenger
                .edit_text(session.message, "No quality profiles configured in Sonarr")
                .await?;
            return Ok(());
        }
        if root_folders.is_empty() {
            self.sessions.clear(chat_id);
            self.messenger
                .edit_text(session.message, "No root folders configured in Sonarr")
                .await?;
            return Ok(());
        }

        session.profiles = profiles;
        session.root_folders = root_folders;
        session.tags = tags;
        session.advance(AddStep::Confirm);
        self.store_and_render_add(chat_id, session).await
    }

    async fn on_add_submit(
        &self,
        chat_id: i64,
        session: AddSeriesSession,
        missing: bool,
        cutoff: bool,
    ) -> Result<()> {
        let (Some(chosen), Some(profile_id), Some(root_folder_path), Some(series_type), Some(monitor)) = (
            session.chosen.clone(),
            session.profile_id,
            session.root_folder_path.clone(),
            session.series_type.clone(),
            session.monitor.clone(),
        ) else {
            return self.reject_unrecognized(chat_id).await;
        };

        let input = AddSeriesInput {
            tvdb_id: chosen.tvdb_id,
            title: chosen.title.clone(),
            quality_profile_id: profile_id,
            root_folder_path,
            series_type,
            season_folder: true,
            monitored: monitor != "none",
            tags: session.selected_tags.iter().copied().collect(),
            add_options: AddSeriesOptions {
                monitor,
                search_for_missing_episodes: missing,
                search_for_cutoff_unmet_episodes: cutoff,
            },
        };
        match self.server.add_series(&input).await {
            Ok(added) => {
                self.sessions.clear(chat_id);
                self.messenger
                    .edit_text(
                        session.message,
                        &format!("Added {} to the library", added.title),
                    )
                    .await?;
                Ok(())
            }
            Err(err) => self.surface_at(session.message, err).await,
        }
    }

    async fn store_and_render_add(&self, chat_id: i64, session: AddSeriesSession) -> Result<()> {
        self.sessions.set_add_session(chat_id, session.clone());
        self.render_add_step(&session).await
    }

    async fn render_add_step(&self, session: &AddSeriesSession) -> Result<()> {
        let (text, keyboard, link_preview) = match session.step {
            AddStep::SearchResults => render_search_results(session),
            AddStep::Confirm => render_confirm(session),
            AddStep::Profile => render_profiles(session),
            AddStep::RootFolder => render_root_folders(session),
            AddStep::Tags => render_tags(session),
            AddStep::Type => render_types(session),
            AddStep::Monitor => render_monitor(session),
            AddStep::AddOptions => render_add_options(session),
        };
        self.messenger
            .edit_markup(session.message, &text, keyboard, link_preview)
            .await
    }
}

fn footer(step: AddStep) -> Keyboard {
    let mut keyboard = Keyboard::new();
    if !matches!(step, AddStep::SearchResults | AddStep::Confirm) {
        keyboard.push_row(kb::back_row(T_BACK));
    }
    keyboard.push_button(Button::new("Cancel", T_CANCEL));
    keyboard
}

fn render_search_results(session: &AddSeriesSession) -> (String, Keyboard, bool) {
    let mut text = "*Search results:*\n\n".to_string();
    for series in &session.results {
        text.push_str(&format::imdb_line(series));
    }
    let refs: Vec<&Series> = session.results.iter().collect();
    let mut keyboard = kb::series_rows(&refs, P_TVDBID, |_| false);
    keyboard.append(footer(AddStep::SearchResults));
    (text, keyboard, false)
}

fn render_confirm(session: &AddSeriesSession) -> (String, Keyboard, bool) {
    let mut text = String::new();
    if let Some(series) = &session.chosen {
        text.push_str(&format::imdb_line(series));
    }
    text.push_str("\nAdd this series to the library?");
    let keyboard = Keyboard::stacked(&[("Yes", T_YES), ("Cancel", T_CANCEL)]);
    // The one screen where the link preview helps identify the series.
    (text, keyboard, true)
}

fn render_profiles(session: &AddSeriesSession) -> (String, Keyboard, bool) {
    let text = format!("{}Select a quality profile:", session.heading());
    let mut keyboard = Keyboard::new();
    for profile in &session.profiles {
        keyboard.push_button(Button::new(
            profile.name.clone(),
            format!("{}{}", P_PROFILE, profile.id),
        ));
    }
    keyboard.append(footer(AddStep::Profile));
    (text, keyboard, false)
}

fn render_root_folders(session: &AddSeriesSession) -> (String, Keyboard, bool) {
    let text = format!("{}Select a root folder:", session.heading());
    let mut keyboard = Keyboard::new();
    for (index, folder) in session.root_folders.iter().enumerate() {
        keyboard.push_button(Button::new(
            format!(
                "{} ({} free)",
                folder.path,
                format::byte_count(folder.free_space)
            ),
            format!("{}{}", P_FOLDER, index),
        ));
    }
    keyboard.append(footer(AddStep::RootFolder));
    (text, keyboard, false)
}

fn render_tags(session: &AddSeriesSession) -> (String, Keyboard, bool) {
    let text = format!("{}Select tags:", session.heading());
    let mut keyboard = Keyboard::new();
    for tag in &session.tags {
        let selected = session.selected_tags.contains(&tag.id);
        let label = if selected {
            format!("{} {}", tag.label, kb::CHECK)
        } else {
            tag.label.clone()
        };
        keyboard.push_button(Button::new(label, format!("{}{}", P_TAG, tag.id)));
    }
    keyboard.push_button(Button::new("Done", T_TAG_DONE));
    keyboard.append(footer(AddStep::Tags));
    (text, keyboard, false)
}

fn render_types(session: &AddSeriesSession) -> (String, Keyboard, bool) {
    let text = format!("{}Select the series type:", session.heading());
    let mut keyboard = Keyboard::stacked(&[
        ("Standard", "ADDSERIES_TYPE_standard"),
        ("Daily", "ADDSERIES_TYPE_daily"),
        ("Anime", "ADDSERIES_TYPE_anime"),
    ]);
    keyboard.append(footer(AddStep::Type));
    (text, keyboard, false)
}

fn render_monitor(session: &AddSeriesSession) -> (String, Keyboard, bool) {
    let text = format!("{}Select which episodes to monitor:", session.heading());
    let mut keyboard = Keyboard::new();
    for (mode, label) in MONITOR_MODES {
        keyboard.push_button(Button::new(label, format!("{}{}", P_MONITOR, mode)));
    }
    keyboard.append(footer(AddStep::Monitor));
    (text, keyboard, false)
}

fn render_add_options(session: &AddSeriesSession) -> (String, Keyboard, bool) {
    let text = format!("{}How should the series be added?", session.heading());
    let mut keyboard = Keyboard::stacked(&[
        ("Add", T_ADD_PLAIN),
        ("Add + search missing", T_ADD_MISSING),
        ("Add + search missing & cutoff unmet", T_ADD_MISSING_CUTOFF),
        ("Add + search cutoff unmet", T_ADD_CUTOFF),
    ]);
    keyboard.append(footer(AddStep::AddOptions));
    (text, keyboard, false)
}
