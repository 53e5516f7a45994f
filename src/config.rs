use std::collections::HashSet;

use thiserror::Error;

/// All configuration comes from the process environment at startup. Any
/// missing or malformed value is fatal before the bot starts polling.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub allowed_chat_ids: HashSet<i64>,
    pub page_size: usize,
    pub sonarr_protocol: String,
    pub sonarr_hostname: String,
    pub sonarr_port: u16,
    pub sonarr_api_key: String,
    pub sonarr_base_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is empty or not set")]
    Missing(&'static str),
    #[error("{0} is not a valid number")]
    NotANumber(&'static str),
    #[error("TELESONARR_ALLOWED_CHAT_IDS contains non-integer value: {0}")]
    BadChatId(String),
    #[error("TELESONARR_SONARR_PROTOCOL must be http or https")]
    BadProtocol,
    #[error("TELESONARR_PAGE_SIZE must be at least 1")]
    PageSizeZero,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration through an injected lookup, so tests do not have
    /// to mutate the process environment.
    pub fn load_from(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            match var(key) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(ConfigError::Missing(key)),
            }
        };

        let telegram_bot_token = required("TELESONARR_TELEGRAM_BOT_TOKEN")?;

        let allowed = required("TELESONARR_ALLOWED_CHAT_IDS")?;
        let mut allowed_chat_ids = HashSet::new();
        for entry in allowed.split(',') {
            let id: i64 = entry
                .trim()
                .parse()
                .map_err(|_| ConfigError::BadChatId(entry.trim().to_string()))?;
            allowed_chat_ids.insert(id);
        }

        let page_size: usize = required("TELESONARR_PAGE_SIZE")?
            .parse()
            .map_err(|_| ConfigError::NotANumber("TELESONARR_PAGE_SIZE"))?;
        if page_size == 0 {
            return Err(ConfigError::PageSizeZero);
        }

        let sonarr_protocol = required("TELESONARR_SONARR_PROTOCOL")?.to_lowercase();
        if sonarr_protocol != "http" && sonarr_protocol != "https" {
            return Err(ConfigError::BadProtocol);
        }

        let sonarr_hostname = required("TELESONARR_SONARR_HOSTNAME")?;
        let sonarr_port: u16 = required("TELESONARR_SONARR_PORT")?
            .parse()
            .map_err(|_| ConfigError::NotANumber("TELESONARR_SONARR_PORT"))?;
        let sonarr_api_key = required("TELESONARR_SONARR_API_KEY")?;
        let sonarr_base_url = var("TELESONARR_SONARR_BASE_URL").unwrap_or_default();

        Ok(Config {
            telegram_bot_token,
            allowed_chat_ids,
            page_size,
            sonarr_protocol,
            sonarr_hostname,
            sonarr_port,
            sonarr_api_key,
            sonarr_base_url,
        })
    }

    /// Base URL of the Sonarr instance, without a trailing slash.
    pub fn sonarr_url(&self) -> String {
        let base = self.sonarr_base_url.trim_matches('/');
        if base.is_empty() {
            format!(
                "{}://{}:{}",
                self.sonarr_protocol, self.sonarr_hostname, self.sonarr_port
            )
        } else {
            format!(
                "{}://{}:{}/{}",
                self.sonarr_protocol, self.sonarr_hostname, self.sonarr_port, base
            )
        }
    }

    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chat_ids.contains(&chat_id)
    }
}
