use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

use crate::infrastructure::mailer::resend::DEFAULT_RESEND_API_URL;

pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub admin_email: Option<String>,
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub magic_link_url: String,
    pub mail_from: String,
    pub static_dir: String,
    pub log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("admin_email", &self.admin_email)
            .field("resend_api_key", &self.resend_api_key.as_ref().map(|_| "<redacted>"))
            .field("resend_api_url", &self.resend_api_url)
            .field("magic_link_url", &self.magic_link_url)
            .field("mail_from", &self.mail_from)
            .field("static_dir", &self.static_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8000),
            database_url: non_empty("DATABASE_URL"),
            admin_email: non_empty("ADMIN_EMAIL"),
            resend_api_key: non_empty("RESEND_API_KEY"),
            resend_api_url: non_empty("RESEND_API_URL").unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string()),
            magic_link_url: non_empty("MAGIC_LINK_URL")
                .unwrap_or_else(|| "http://localhost:3000/login".to_string()),
            mail_from: non_empty("MAIL_FROM").unwrap_or_else(|| "onboarding@resend.dev".to_string()),
            static_dir: non_empty("STATIC_DIR").unwrap_or_else(|| "frontend/build".to_string()),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
