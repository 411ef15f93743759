//! Environment-backed configuration shared by the server and services.

use tracing::warn;

const DEFAULT_CHAT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_APP_URL: &str = "https://vigor30.app";
const DEFAULT_APP_NAME: &str = "Vigor30";
const DEFAULT_EMAIL_FROM: &str = "Vigor30 Coach <coach@vigor30.app>";
const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Chat completions endpoint for the coach
    pub chat_api_url: String,
    pub chat_api_key: Option<String>,
    /// Attribution sent with every chat request
    pub app_url: String,
    pub app_name: String,
    /// Quiz result store endpoint (REST insert) and its key
    pub result_store_url: Option<String>,
    pub result_store_key: Option<String>,
    /// Transactional email provider key and sender address
    pub email_api_key: Option<String>,
    pub email_from: String,
    /// Legacy webhook mirroring every submission
    pub legacy_webhook_url: Option<String>,
}

impl Config {
    /// Load from the environment. Missing optional values disable the
    /// corresponding sink instead of failing startup.
    pub fn from_env() -> Self {
        let chat_api_key = env_opt("OPENROUTER_API_KEY");
        if chat_api_key.is_none() {
            warn!("OPENROUTER_API_KEY not set - coach chat requests will fail");
        }

        let result_store_url = env_opt("RESULT_STORE_URL");
        let result_store_key = env_opt("RESULT_STORE_KEY");
        if result_store_url.is_none() {
            warn!("RESULT_STORE_URL not set - quiz results will not be persisted");
        }

        let email_api_key = env_opt("RESEND_API_KEY");
        if email_api_key.is_none() {
            warn!("RESEND_API_KEY not set - result emails will not be sent");
        }

        Self {
            port: env_opt("PORT")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            chat_api_url: env_opt("CHAT_API_URL")
                .unwrap_or_else(|| DEFAULT_CHAT_API_URL.to_string()),
            chat_api_key,
            app_url: env_opt("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
            app_name: env_opt("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            result_store_url,
            result_store_key,
            email_api_key,
            email_from: env_opt("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            legacy_webhook_url: env_opt("LEGACY_WEBHOOK_URL"),
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
