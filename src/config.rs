use std::env;

use crate::engine::dispatch::DispatchLimits;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub seed_time_slots: bool,
    pub seed_sample_partners: bool,
    pub limits: DispatchLimits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = DispatchLimits::default();
        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Compact,
            },
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            seed_time_slots: parse_or_default("SEED_TIME_SLOTS", true)?,
            seed_sample_partners: parse_or_default("SEED_SAMPLE_PARTNERS", false)?,
            limits: DispatchLimits {
                available_partners_default: parse_or_default(
                    "AVAILABLE_PARTNERS_DEFAULT_LIMIT",
                    defaults.available_partners_default,
                )?,
                available_partners_max: parse_or_default(
                    "AVAILABLE_PARTNERS_MAX_LIMIT",
                    defaults.available_partners_max,
                )?,
                admin_list: parse_or_default("ADMIN_LIST_LIMIT", defaults.admin_list)?,
                requester_history: parse_or_default(
                    "REQUESTER_HISTORY_LIMIT",
                    defaults.requester_history,
                )?,
            },
        })
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
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
