use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Sender mailbox used for outbound mail (also the SMTP login)
    pub email_address: String,

    /// SMTP password (an app password for Gmail accounts)
    pub email_password: String,

    /// SMTP relay host, implicit TLS (default: smtp.gmail.com)
    pub smtp_host: String,

    /// SMTP relay port (default: 465)
    pub smtp_port: u16,

    /// Spreadsheet holding the job queue
    pub spreadsheet_id: String,

    /// Sheet (tab) name used for A1-notation reads
    pub sheet_name: String,

    /// Numeric sheet id used for row deletion (default: 0, the first tab)
    pub sheet_id: i64,

    /// Service-account key, the full JSON document as a string
    pub google_credentials: String,

    /// Telegram bot token used for status reports
    pub telegram_bot_token: String,

    /// Shared secret expected in the `token` query parameter; unset disables the check
    pub webhook_token: Option<String>,

    /// HTTP listen port (default: 10000)
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };

        Ok(Self {
            email_address: require("EMAIL_ADDRESS")?,
            email_password: require("EMAIL_PASSWORD")?,
            smtp_host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: get("SMTP_PORT")
                .unwrap_or_else(|| "465".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SMTP_PORT must be a valid u16"))?,
            spreadsheet_id: require("SPREADSHEET_ID")?,
            sheet_name: require("SHEET_NAME")?,
            sheet_id: get("SHEET_ID")
                .unwrap_or_else(|| "0".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SHEET_ID must be a valid i64"))?,
            google_credentials: require("GOOGLE_CREDENTIALS_FILE")?,
            telegram_bot_token: require("TELEGRAM_BOT_TOKEN")?,
            webhook_token: get("WEBHOOK_TOKEN"),
            port: get("PORT")
                .unwrap_or_else(|| "10000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
        })
    }
}
