use anyhow::Context;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

pub const DEFAULT_PAYME_BASE_URL: &str = "https://test.paycom.uz";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Gateway settings handed to the webhook core and the order flow.
#[derive(Debug, Deserialize, Clone)]
pub struct PaymeSettings {
    /// Shared secret the gateway sends as the Basic-Auth password.
    pub key: String,
    pub merchant_id: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub payme: PaymeSettings,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            payme: PaymeSettings {
                key: env::var("PAYME_KEY").context("PAYME_KEY is required")?,
                merchant_id: env::var("PAYME_MERCHANT_ID")
                    .context("PAYME_MERCHANT_ID is required")?,
                base_url: env::var("PAYME_BASE_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PAYME_BASE_URL.to_string()),
            },
            log_format: parse_log_format(
                &env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            )?,
        })
    }
}

fn parse_log_format(raw: &str) -> anyhow::Result<LogFormat> {
    match raw.trim().to_lowercase().as_str() {
        "pretty" | "" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
    }
}
