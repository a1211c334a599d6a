use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_stt_model: String,
    pub yandex_maps_api_key: Option<String>,
    pub osrm_base_url: Option<String>,
    pub external_timeout_secs: u64,
    pub recent_orders_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            openai_model: non_empty("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            openai_stt_model: non_empty("OPENAI_STT_MODEL")
                .unwrap_or_else(|| "whisper-1".to_string()),
            yandex_maps_api_key: non_empty("YANDEX_MAPS_API_KEY"),
            osrm_base_url: match env::var("OSRM_BASE_URL") {
                Ok(raw) if raw.trim().is_empty() => None,
                Ok(raw) => Some(raw.trim().to_string()),
                Err(_) => Some("https://router.project-osrm.org".to_string()),
            },
            external_timeout_secs: parse_or_default("EXTERNAL_TIMEOUT_SECS", 20)?,
            recent_orders_limit: parse_or_default("RECENT_ORDERS_LIMIT", 10)?,
        })
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
