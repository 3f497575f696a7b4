//! Application configuration, read once at startup.

use std::env;
use std::time::Duration;

use anyhow::Context;

use crate::payments::stripe::DEFAULT_API_BASE;
use crate::pricing::models::RateSchedule;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub currency: String,
    pub payment_timeout_secs: u64,
    pub rate_schedule: RateSchedule,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let rate_schedule = match env_opt("RATE_SEASONS") {
            Some(raw) => serde_json::from_str::<RateSchedule>(&raw)
                .context("RATE_SEASONS is not a valid season list")?,
            None => RateSchedule::default(),
        };

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse_or("PORT", 8888),
            stripe_secret_key: env_opt("STRIPE_SECRET_KEY"),
            stripe_api_base: env_or("STRIPE_API_BASE", DEFAULT_API_BASE),
            success_url: env_opt("SUCCESS_URL"),
            cancel_url: env_opt("CANCEL_URL"),
            allowed_origins: parse_csv(&env_or("ALLOWED_ORIGINS", "*")),
            currency: env_or("CHECKOUT_CURRENCY", "eur").to_lowercase(),
            payment_timeout_secs: env_parse_or("PAYMENT_TIMEOUT_SECS", 10),
            rate_schedule,
        })
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout_secs)
    }

    /// Success and cancel redirect targets, if both are configured
    pub fn redirect_urls(&self) -> Option<(&str, &str)> {
        match (self.success_url.as_deref(), self.cancel_url.as_deref()) {
            (Some(success), Some(cancel)) => Some((success, cancel)),
            _ => None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
            stripe_secret_key: None,
            stripe_api_base: DEFAULT_API_BASE.to_string(),
            success_url: None,
            cancel_url: None,
            allowed_origins: vec!["*".to_string()],
            currency: "eur".to_string(),
            payment_timeout_secs: 10,
            rate_schedule: RateSchedule::default(),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env_opt(key)
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_csv_origins() {
        assert_eq!(
            parse_csv("https://a.example, https://b.example,,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_csv("").is_empty());
    }

    #[test]
    fn redirect_urls_need_both() {
        let mut config = AppConfig::default();
        assert!(config.redirect_urls().is_none());

        config.success_url = Some("https://example.com/ok".to_string());
        assert!(config.redirect_urls().is_none());

        config.cancel_url = Some("https://example.com/cancel".to_string());
        assert_eq!(
            config.redirect_urls(),
            Some(("https://example.com/ok", "https://example.com/cancel"))
        );
    }
}
