//! One-shot commands that run outside the wizards and leave any active
//! wizard untouched.

use anyhow::Result;
use chrono::{Duration, Utc};

use crate::format;
use crate::sonarr::CommandRequest;
use crate::transport::Keyboard;

use super::Bot;

/// Window of the upcoming-episodes view.
const UPCOMING_DAYS: i64 = 30;

impl Bot {
    /// `/free`: root folders and their free space as an aligned table.
    pub(crate) async fn free_space(&self, chat_id: i64) -> Result<()> {
        let message = self
            .messenger
            .send_text(chat_id, "Checking disk space, please wait...")
            .await?;
        let folders = match self.server.root_folders().await {
            Ok(folders) => folders,
            Err(err) => return self.surface_at(message, err).await,
        };
        if folders.is_empty() {
            self.messenger
                .edit_text(message, "No root folders configured in Sonarr")
                .await?;
            return Ok(());
        }
        let text = format!("*Free space*\n\n{}", format::root_folder_table(&folders));
        self.messenger
            .edit_markup(message, &text, Keyboard::new(), false)
            .await
    }

    /// `/up`: episodes airing within the next 30 days.
    pub(crate) async fn upcoming(&self, chat_id: i64) -> Result<()> {
        let message = self
            .messenger
            .send_text(chat_id, "Checking the calendar, please wait...")
            .await?;
        let now = Utc::now();
        let episodes = match self.server.calendar(now, now + Duration::days(UPCOMING_DAYS)).await {
            Ok(episodes) => episodes,
            Err(err) => return self.surface_at(message, err).await,
        };
        if episodes.is_empty() {
            self.messenger
                .edit_text(
                    message,
                    &format!("No upcoming releases in the next {} days", UPCOMING_DAYS),
                )
                .await?;
            return Ok(());
        }

        let mut text = "*Upcoming releases*\n\n".to_string();
        for episode in &episodes {
            let title = episode
                .series
                .as_ref()
                .map(|series| series.title.as_str())
                .unwrap_or("Unknown series");
            let air_date = episode
                .air_date_utc
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "TBA".to_string());
            text.push_str(&format!(
                "{} S{:02}E{:02} \\- _{}_\n",
                format::escape(title),
                episode.season_number,
                episode.episode_number,
                format::escape(&air_date)
            ));
        }
        self.messenger
            .edit_markup(message, &text, Keyboard::new(), false)
            .await
    }

    /// `/rss`: trigger an RSS sync run.
    pub(crate) async fn rss_sync(&self, chat_id: i64) -> Result<()> {
        if let Err(err) = self.server.send_command(&CommandRequest::named("RssSync")).await {
            return self.surface(chat_id, err).await;
        }
        self.messenger.send_text(chat_id, "RSS sync started").await?;
        Ok(())
    }

    /// `/searchmonitored`: one batched search command covering every
    /// monitored series, in library order.
    pub(crate) async fn search_monitored(&self, chat_id: i64) -> Result<()> {
        let message = self
            .messenger
            .send_text(chat_id, "Starting searches, please wait...")
            .await?;
        let library = match self.server.all_series().await {
            Ok(library) => library,
            Err(err) => return self.surface_at(message, err).await,
        };
        let monitored: Vec<i64> = library
            .iter()
            .filter(|series| series.monitored)
            .map(|series| series.id)
            .collect();
        if monitored.is_empty() {
            self.messenger
                .edit_text(message, "No monitored series in the library")
                .await?;
            return Ok(());
        }
        let count = monitored.len();
        let command = CommandRequest::for_series("SeriesSearch", monitored);
        if let Err(err) = self.server.send_command(&command).await {
            return self.surface_at(message, err).await;
        }
        self.messenger
            .edit_text(
                message,
                &format!("Triggered a search for {} monitored series", count),
            )
            .await?;
        Ok(())
    }

    /// `/updateall`: refresh metadata for every series in the library
    /// with a single batched command.
    pub(crate) async fn update_all(&self, chat_id: i64) -> Result<()> {
        let message = self
            .messenger
            .send_text(chat_id, "Starting refresh, please wait...")
            .await?;
        let library = match self.server.all_series().await {
            Ok(library) => library,
            Err(err) => return self.surface_at(message, err).await,
        };
        if library.is_empty() {
            self.messenger
                .edit_text(message, "The library is empty")
                .await?;
            return Ok(());
        }
        let ids: Vec<i64> = library.iter().map(|series| series.id).collect();
        let command = CommandRequest::for_series("RefreshSeries", ids);
        if let Err(err) = self.server.send_command(&command).await {
            return self.surface_at(message, err).await;
        }
        self.messenger
            .edit_text(
                message,
                &format!("Triggered a refresh for {} series", library.len()),
            )
            .await?;
        Ok(())
    }

    /// `/system`: raw system status as pretty-printed JSON.
    pub(crate) async fn system_status(&self, chat_id: i64) -> Result<()> {
        let status = match self.server.system_status().await {
            Ok(status) => status,
            Err(err) => return self.surface(chat_id, err).await,
        };
        let pretty = serde_json::to_string_pretty(&status)
            .unwrap_or_else(|_| status.to_string());
        self.messenger.send_text(chat_id, &pretty).await?;
        Ok(())
    }
}
