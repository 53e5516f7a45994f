//! Conversational core: the [`Bot`] owns the session store and routes
//! inbound events to the wizard that is currently active for the chat.

pub mod add;
pub mod commands;
pub mod delete;
pub mod keyboard;
pub mod library;
pub mod paging;
pub mod season;
pub mod series;
pub mod session;

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::sonarr::SeriesServer;
use crate::transport::{Event, EventKind, Messenger, MessageRef};

pub use session::{ActiveWizard, LibraryMode, SessionStore};

pub const MSG_ACCESS_DENIED: &str = "Access denied. You are not authorized.";
pub const MSG_COMMANDS_CLEARED: &str = "All commands have been cleared";
pub const MSG_UNRECOGNIZED: &str = "I am not sure what you mean.\nAll commands have been cleared";
pub const MSG_NO_RESULTS: &str = "No series found matching your search criteria";
pub const MSG_TOO_MANY_RESULTS: &str =
    "Result size too large, please narrow down your search criteria";

/// Lookup responses larger than this are rejected instead of rendered.
pub const MAX_SEARCH_RESULTS: usize = 25;

pub struct Bot {
    config: Config,
    server: Arc<dyn SeriesServer>,
    messenger: Arc<dyn Messenger>,
    sessions: SessionStore,
}

impl Bot {
    pub fn new(
        config: Config,
        server: Arc<dyn SeriesServer>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            config,
            server,
            messenger,
            sessions: SessionStore::new(),
        }
    }

    /// Entry point for every inbound event. Authorization happens before
    /// anything else; unauthorized chats never reach the session store.
    pub async fn handle_event(&self, event: Event) -> Result<()> {
        let chat_id = event.chat_id;
        if !self.config.is_allowed(chat_id) {
            tracing::warn!(chat_id, "rejected event from unauthorized chat");
            self.messenger.send_text(chat_id, MSG_ACCESS_DENIED).await?;
            return Ok(());
        }

        match event.kind {
            EventKind::Command { name, args } => self.handle_command(chat_id, &name, &args).await,
            // Bare text is an implicit search query.
            EventKind::Text(text) => self.start_add_series(chat_id, text.trim()).await,
            EventKind::Callback(token) => self.handle_callback(chat_id, &token).await,
        }
    }

    async fn handle_command(&self, chat_id: i64, name: &str, args: &str) -> Result<()> {
        let args = args.trim();
        match name.to_ascii_lowercase().as_str() {
            "q" | "query" | "add" => self.start_add_series(chat_id, args).await,
            "library" | "series" | "l" => self.start_library(chat_id, args).await,
            "delete" | "remove" | "d" => self.start_delete_series(chat_id, args).await,
            "clear" | "cancel" | "stop" => {
                self.sessions.clear(chat_id);
                self.messenger.send_text(chat_id, MSG_COMMANDS_CLEARED).await?;
                Ok(())
            }
            "free" | "diskspace" | "rootfolder" | "rootfolders" => self.free_space(chat_id).await,
            "up" | "upcoming" => self.upcoming(chat_id).await,
            "rss" => self.rss_sync(chat_id).await,
            "searchmonitored" => self.search_monitored(chat_id).await,
            "updateall" => self.update_all(chat_id).await,
            "system" | "status" => self.system_status(chat_id).await,
            "id" => {
                self.messenger
                    .send_text(chat_id, &format!("Your chat id: {}", chat_id))
                    .await?;
                Ok(())
            }
            _ => self.send_help(chat_id).await,
        }
    }

    /// Route a callback token to whichever wizard owns the chat. A missing
    /// marker or an undecodable token clears everything.
    async fn handle_callback(&self, chat_id: i64, token: &str) -> Result<()> {
        match self.sessions.active(chat_id) {
            Some(ActiveWizard::Add) => self.on_add_callback(chat_id, token).await,
            Some(ActiveWizard::Delete) => self.on_delete_callback(chat_id, token).await,
            Some(ActiveWizard::Library(mode)) => {
                self.on_library_callback(chat_id, mode, token).await
            }
            None => self.reject_unrecognized(chat_id).await,
        }
    }

    /// Clear all state and tell the user so. Shared fallback for callbacks
    /// that no wizard can decode.
    pub(crate) async fn reject_unrecognized(&self, chat_id: i64) -> Result<()> {
        tracing::debug!(chat_id, "unrecognized input, clearing session");
        self.sessions.clear(chat_id);
        self.messenger.send_text(chat_id, MSG_UNRECOGNIZED).await?;
        Ok(())
    }

    /// Surface a collaborator failure as a fresh message; wizard state is
    /// left untouched.
    pub(crate) async fn surface(&self, chat_id: i64, err: anyhow::Error) -> Result<()> {
        tracing::warn!(chat_id, error = %err, "external call failed");
        self.messenger.send_text(chat_id, &err.to_string()).await?;
        Ok(())
    }

    /// Surface a collaborator failure into the wizard's own message,
    /// replacing whatever keyboard it showed; state is left untouched.
    pub(crate) async fn surface_at(&self, target: MessageRef, err: anyhow::Error) -> Result<()> {
        tracing::warn!(chat_id = target.chat_id, error = %err, "external call failed");
        self.messenger.edit_text(target, &err.to_string()).await?;
        Ok(())
    }

    async fn send_help(&self, chat_id: i64) -> Result<()> {
        let help = "Commands:\n\
            /q <name> - search for a series to add (bare text works too)\n\
            /library [name] - browse and edit the library\n\
            /delete [name] - remove series from the library\n\
            /up - upcoming episodes for the next 30 days\n\
            /free - root folder disk space\n\
            /rss - trigger an RSS sync\n\
            /searchmonitored - search all monitored series\n\
            /updateall - refresh all series metadata\n\
            /system - Sonarr system status\n\
            /id - show your chat id\n\
            /clear - cancel the current command";
        self.messenger.send_text(chat_id, help).await?;
        Ok(())
    }
}
