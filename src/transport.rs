//! Transport contracts between the wizard core and the chat service.
//!
//! The core consumes `(chat, kind, payload)` triples and talks back through
//! the [`Messenger`] trait, so tests can drive it without any network.

use anyhow::Result;

/// One inbound event from the chat transport.
#[derive(Debug, Clone)]
pub struct Event {
    /// Stable per-user session key (the Telegram chat id).
    pub chat_id: i64,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    /// A `/command` message, split into name and trailing arguments.
    Command { name: String, args: String },
    /// Free text without a leading slash; treated as a search query.
    Text(String),
    /// An inline-keyboard response carrying the button token.
    Callback(String),
}

impl Event {
    pub fn command(chat_id: i64, name: &str, args: &str) -> Self {
        Event {
            chat_id,
            kind: EventKind::Command {
                name: name.to_string(),
                args: args.to_string(),
            },
        }
    }

    pub fn text(chat_id: i64, text: &str) -> Self {
        Event {
            chat_id,
            kind: EventKind::Text(text.to_string()),
        }
    }

    pub fn callback(chat_id: i64, token: &str) -> Self {
        Event {
            chat_id,
            kind: EventKind::Callback(token.to_string()),
        }
    }
}

/// Coordinates of a previously sent message, used for in-place edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// One tappable choice: visible label plus the opaque token that comes back
/// in the answering callback event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Button {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Ordered rows of choices, the transport-neutral shape of an inline
/// keyboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    /// One button per row, in order. The dominant layout in every wizard.
    pub fn stacked(pairs: &[(&str, &str)]) -> Self {
        Keyboard {
            rows: pairs
                .iter()
                .map(|(label, token)| vec![Button::new(*label, *token)])
                .collect(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Button>) {
        self.rows.push(row);
    }

    pub fn push_button(&mut self, button: Button) {
        self.rows.push(vec![button]);
    }

    /// Append another keyboard's rows below this one.
    pub fn append(&mut self, other: Keyboard) {
        self.rows.extend(other.rows);
    }

    /// Flat iterator over every button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// Outbound side of the chat transport.
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain-text message without a keyboard. Used for the wizard
    /// placeholder messages and for error notices.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageRef>;

    /// Replace a previously sent message with plain text, dropping any
    /// keyboard it carried. Terminal wizard outcomes go through here.
    async fn edit_text(&self, target: MessageRef, text: &str) -> Result<()>;

    /// Replace a previously sent message with MarkdownV2 text and an inline
    /// keyboard. `link_preview` controls whether Telegram unfurls the first
    /// link (wanted on single-series confirm screens, noise elsewhere).
    async fn edit_markup(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Keyboard,
        link_preview: bool,
    ) -> Result<()>;
}
