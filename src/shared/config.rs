//! Application configuration. Credentials, connection parameters, paths.
//!
//! Everything the components need is passed in explicitly at construction;
//! nothing reads ambient globals past this point.

use serde::Deserialize;

/// Where the correlation map lives unless overridden.
pub const DEFAULT_MAP_PATH: &str = "./data/ticket_map.json";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Bot token from @BotFather. Read from TICKET_BOT_BOT_TOKEN.
    pub bot_token: Option<String>,

    /// Telegram chat id of the admin who receives alerts. Read from TICKET_BOT_ADMIN_CHAT_ID.
    #[serde(default)]
    pub admin_chat_id: Option<String>,

    /// MySQL URL of the SmartPanel database. Read from TICKET_BOT_DATABASE_URL.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Correlation map file path. Read from TICKET_BOT_MAP_PATH.
    #[serde(default)]
    pub map_path: Option<String>,

    /// Bot API base URL override (tests, self-hosted relays). Read from TICKET_BOT_API_BASE_URL.
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("TICKET_BOT"));
        if let Ok(path) = std::env::var("TICKET_BOT_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the bot token from config or TICKET_BOT_BOT_TOKEN env.
    pub fn bot_token(&self) -> Option<String> {
        self.bot_token
            .clone()
            .or_else(|| std::env::var("TICKET_BOT_BOT_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }

    /// Returns the admin chat id, parsed, from config or TICKET_BOT_ADMIN_CHAT_ID env.
    pub fn admin_chat_id(&self) -> Option<i64> {
        self.admin_chat_id
            .clone()
            .or_else(|| std::env::var("TICKET_BOT_ADMIN_CHAT_ID").ok())
            .and_then(|s| s.trim().parse().ok())
    }

    /// Returns the database URL from config or TICKET_BOT_DATABASE_URL env.
    pub fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("TICKET_BOT_DATABASE_URL").ok())
            .filter(|u| !u.is_empty())
    }

    /// Returns the map file path. Defaults to DEFAULT_MAP_PATH.
    pub fn map_path_or_default(&self) -> String {
        self.map_path
            .clone()
            .unwrap_or_else(|| DEFAULT_MAP_PATH.to_string())
    }

    /// Returns the Bot API base URL. Defaults to api.telegram.org.
    pub fn api_base_url_or_default(&self) -> String {
        self.api_base_url.clone().unwrap_or_else(|| {
            crate::adapters::telegram::bot_api::TELEGRAM_API_BASE_URL_DEFAULT.to_string()
        })
    }
}
