use std::env;

use chrono_tz::Tz;

use crate::models::profile::DEFAULT_CALORIE_TARGET;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    /// Shared bearer secret for the chat transport and the dashboard.
    pub api_token: String,

    pub claude_api_key: String,
    pub claude_model: String,
    pub claude_base_url: String,
    pub claude_timeout_secs: u64,

    /// Reference timezone for every day boundary.
    pub timezone: Tz,
    pub default_calorie_target: i32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8501".into()),

            api_token: env::var("API_TOKEN").expect("API_TOKEN must be set"),

            claude_api_key: env::var("CLAUDE_API_KEY").unwrap_or_else(|_| String::new()),
            claude_model: env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-5-20250929".into()),
            claude_base_url: env::var("CLAUDE_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".into()),
            claude_timeout_secs: env::var("CLAUDE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),

            timezone: env::var("TRACKER_TIMEZONE")
                .unwrap_or_else(|_| "UTC".into())
                .parse()
                .expect("TRACKER_TIMEZONE must be an IANA timezone name"),
            default_calorie_target: env::var("DEFAULT_CALORIE_TARGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CALORIE_TARGET),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
