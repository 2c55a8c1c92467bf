use crate::config::Config;
use anyhow::{Context, Result};

/// Checks configuration values that `Config::from_env` accepts syntactically
/// but that would break the webhook at runtime.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL is empty");
    }
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }
    if config.database_max_connections == 0 {
        anyhow::bail!("DATABASE_MAX_CONNECTIONS must be greater than 0");
    }
    if config.payme.key.trim().is_empty() {
        anyhow::bail!("PAYME_KEY is empty");
    }
    if config.payme.merchant_id.trim().is_empty() {
        anyhow::bail!("PAYME_MERCHANT_ID is empty");
    }

    let base_url =
        url::Url::parse(&config.payme.base_url).context("PAYME_BASE_URL is not a valid URL")?;
    if !matches!(base_url.scheme(), "http" | "https") {
        anyhow::bail!("PAYME_BASE_URL must use http or https");
    }

    Ok(())
}
