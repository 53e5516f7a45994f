//! In-memory fakes and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use telesonarr::bot::Bot;
use telesonarr::config::Config;
use telesonarr::sonarr::{
    AddSeriesInput, CommandRequest, Episode, EpisodeFile, QualityProfile, RootFolder, Season,
    SeasonStatistics, Series, SeriesServer, Tag,
};
use telesonarr::transport::{Event, Keyboard, Messenger, MessageRef};

pub const CHAT: i64 = 100;

/// Records every outbound message instead of talking to Telegram.
#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    pub sent: Mutex<Vec<(i64, String)>>,
    pub edited: Mutex<Vec<(MessageRef, String)>>,
    pub markups: Mutex<Vec<(MessageRef, String, Keyboard, bool)>>,
}

impl FakeMessenger {
    pub fn last_sent(&self) -> String {
        self.sent.lock().last().map(|(_, text)| text.clone()).unwrap_or_default()
    }

    pub fn last_edited(&self) -> String {
        self.edited.lock().last().map(|(_, text)| text.clone()).unwrap_or_default()
    }

    pub fn last_markup_text(&self) -> String {
        self.markups.lock().last().map(|(_, text, _, _)| text.clone()).unwrap_or_default()
    }

    pub fn last_keyboard(&self) -> Keyboard {
        self.markups
            .lock()
            .last()
            .map(|(_, _, keyboard, _)| keyboard.clone())
            .unwrap_or_default()
    }

    /// Tokens of the most recent keyboard, row by row.
    pub fn tokens(&self) -> Vec<String> {
        self.last_keyboard()
            .buttons()
            .map(|button| button.token.clone())
            .collect()
    }

    /// Label of the button carrying `token` on the most recent keyboard.
    pub fn label_of(&self, token: &str) -> Option<String> {
        self.last_keyboard()
            .buttons()
            .find(|button| button.token == token)
            .map(|button| button.label.clone())
    }
}

#[async_trait::async_trait]
impl Messenger for FakeMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageRef> {
        let mut next_id = self.next_id.lock();
        *next_id += 1;
        let message = MessageRef {
            chat_id,
            message_id: *next_id,
        };
        self.sent.lock().push((chat_id, text.to_string()));
        Ok(message)
    }

    async fn edit_text(&self, target: MessageRef, text: &str) -> Result<()> {
        self.edited.lock().push((target, text.to_string()));
        Ok(())
    }

    async fn edit_markup(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Keyboard,
        link_preview: bool,
    ) -> Result<()> {
        self.markups
            .lock()
            .push((target, text.to_string(), keyboard, link_preview));
        Ok(())
    }
}

/// Configurable in-memory stand-in for Sonarr. Mutation calls are recorded
/// and failures can be injected per id.
#[derive(Default)]
pub struct FakeSeriesServer {
    pub lookup_results: Mutex<Vec<Series>>,
    pub library: Mutex<Vec<Series>>,
    pub profiles: Mutex<Vec<QualityProfile>>,
    pub root_folders: Mutex<Vec<RootFolder>>,
    pub tags: Mutex<Vec<Tag>>,
    pub episodes: Mutex<Vec<Episode>>,
    pub episode_files: Mutex<Vec<EpisodeFile>>,
    pub upcoming: Mutex<Vec<Episode>>,

    pub added: Mutex<Vec<AddSeriesInput>>,
    pub updated: Mutex<Vec<Series>>,
    pub deleted: Mutex<Vec<(i64, bool)>>,
    pub deleted_files: Mutex<Vec<i64>>,
    pub monitor_calls: Mutex<Vec<(Vec<i64>, bool)>>,
    pub commands: Mutex<Vec<CommandRequest>>,

    pub fail_add: Mutex<bool>,
    pub fail_delete_series: Mutex<HashSet<i64>>,
    pub fail_delete_files: Mutex<HashSet<i64>>,
    pub fail_update: Mutex<bool>,
    pub fail_commands: Mutex<bool>,
}

#[async_trait::async_trait]
impl SeriesServer for FakeSeriesServer {
    async fn lookup(&self, _term: &str) -> Result<Vec<Series>> {
        Ok(self.lookup_results.lock().clone())
    }

    async fn all_series(&self) -> Result<Vec<Series>> {
        Ok(self.library.lock().clone())
    }

    async fn series(&self, id: i64) -> Result<Series> {
        match self.library.lock().iter().find(|s| s.id == id) {
            Some(series) => Ok(series.clone()),
            None => bail!("series {} not found", id),
        }
    }

    async fn add_series(&self, input: &AddSeriesInput) -> Result<Series> {
        if *self.fail_add.lock() {
            bail!("add failed: root folder is not writable");
        }
        self.added.lock().push(input.clone());
        Ok(Series {
            id: 1000 + input.tvdb_id,
            title: input.title.clone(),
            tvdb_id: input.tvdb_id,
            monitored: input.monitored,
            ..Default::default()
        })
    }

    async fn update_series(&self, series: &Series) -> Result<Series> {
        if *self.fail_update.lock() {
            bail!("update failed: sqlite is locked");
        }
        self.updated.lock().push(series.clone());
        let mut library = self.library.lock();
        if let Some(existing) = library.iter_mut().find(|s| s.id == series.id) {
            *existing = series.clone();
        }
        Ok(series.clone())
    }

    async fn delete_series(&self, id: i64, delete_files: bool) -> Result<()> {
        if self.fail_delete_series.lock().contains(&id) {
            bail!("delete failed for series {}", id);
        }
        self.deleted.lock().push((id, delete_files));
        self.library.lock().retain(|s| s.id != id);
        Ok(())
    }

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        Ok(self.profiles.lock().clone())
    }

    async fn root_folders(&self) -> Result<Vec<RootFolder>> {
        Ok(self.root_folders.lock().clone())
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags.lock().clone())
    }

    async fn episodes(&self, series_id: i64) -> Result<Vec<Episode>> {
        Ok(self
            .episodes
            .lock()
            .iter()
            .filter(|e| e.series_id == series_id)
            .cloned()
            .collect())
    }

    async fn episode_files(&self, series_id: i64) -> Result<Vec<EpisodeFile>> {
        Ok(self
            .episode_files
            .lock()
            .iter()
            .filter(|f| f.series_id == series_id)
            .cloned()
            .collect())
    }

    async fn delete_episode_file(&self, id: i64) -> Result<()> {
        if self.fail_delete_files.lock().contains(&id) {
            bail!("file delete failed for {}", id);
        }
        self.deleted_files.lock().push(id);
        self.episode_files.lock().retain(|f| f.id != id);
        Ok(())
    }

    async fn set_episode_monitored(&self, episode_ids: &[i64], monitored: bool) -> Result<()> {
        self.monitor_calls
            .lock()
            .push((episode_ids.to_vec(), monitored));
        Ok(())
    }

    async fn send_command(&self, command: &CommandRequest) -> Result<()> {
        if *self.fail_commands.lock() {
            bail!("command {} failed", command.name);
        }
        self.commands.lock().push(command.clone());
        Ok(())
    }

    async fn calendar(&self, _start: DateTime<Utc>, _end: DateTime<Utc>) -> Result<Vec<Episode>> {
        Ok(self.upcoming.lock().clone())
    }

    async fn system_status(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({"version": "4.0.0.0"}))
    }
}

pub struct Harness {
    pub bot: Bot,
    pub server: Arc<FakeSeriesServer>,
    pub messenger: Arc<FakeMessenger>,
}

impl Harness {
    pub fn new() -> Self {
        let config = Config {
            telegram_bot_token: "token".to_string(),
            allowed_chat_ids: HashSet::from([CHAT]),
            page_size: 5,
            sonarr_protocol: "http".to_string(),
            sonarr_hostname: "localhost".to_string(),
            sonarr_port: 8989,
            sonarr_api_key: "key".to_string(),
            sonarr_base_url: String::new(),
        };
        let server = Arc::new(FakeSeriesServer::default());
        let messenger = Arc::new(FakeMessenger::default());
        let bot = Bot::new(config, server.clone(), messenger.clone());
        Harness {
            bot,
            server,
            messenger,
        }
    }

    pub async fn command(&self, name: &str, args: &str) -> Result<()> {
        self.bot.handle_event(Event::command(CHAT, name, args)).await
    }

    pub async fn press(&self, token: &str) -> Result<()> {
        self.bot.handle_event(Event::callback(CHAT, token)).await
    }
}

pub fn lookup_series(title: &str, year: i32, tvdb_id: i64) -> Series {
    Series {
        title: title.to_string(),
        year,
        tvdb_id,
        imdb_id: format!("tt{:07}", tvdb_id),
        ..Default::default()
    }
}

pub fn library_series(id: i64, title: &str, tvdb_id: i64, monitored: bool) -> Series {
    Series {
        id,
        title: title.to_string(),
        year: 2015,
        tvdb_id,
        imdb_id: format!("tt{:07}", tvdb_id),
        monitored,
        status: "continuing".to_string(),
        series_type: "standard".to_string(),
        quality_profile_id: 1,
        seasons: vec![season(1, monitored, 10, 10, 5 << 30)],
        ..Default::default()
    }
}

pub fn season(number: i32, monitored: bool, files: i64, total: i64, size: i64) -> Season {
    Season {
        season_number: number,
        monitored,
        statistics: Some(SeasonStatistics {
            episode_file_count: files,
            total_episode_count: total,
            size_on_disk: size,
        }),
    }
}

pub fn episode(id: i64, series_id: i64, season_number: i32, episode_number: i32) -> Episode {
    Episode {
        id,
        series_id,
        season_number,
        episode_number,
        title: None,
        air_date_utc: None,
        monitored: true,
        has_file: true,
        series: None,
    }
}

pub fn episode_file(id: i64, series_id: i64, season_number: i32) -> EpisodeFile {
    EpisodeFile {
        id,
        series_id,
        season_number,
        size: 1 << 30,
        relative_path: format!("Season {:02}/file-{}.mkv", season_number, id),
    }
}

pub fn profile(id: i64, name: &str) -> QualityProfile {
    QualityProfile {
        id,
        name: name.to_string(),
    }
}

pub fn root_folder(path: &str) -> RootFolder {
    RootFolder {
        path: path.to_string(),
        free_space: 100 << 30,
    }
}

pub fn tag(id: i64, label: &str) -> Tag {
    Tag {
        id,
        label: label.to_string(),
    }
}
