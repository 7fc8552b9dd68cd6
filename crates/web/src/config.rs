use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use storage::services::sport_registry::{DEFAULT_CACHE_TTL, DEFAULT_K_FACTOR};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub api_keys: String,
    pub sport_cache_ttl: Duration,
    pub default_k_factor: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_k_factor = parse_or(
            "DEFAULT_K_FACTOR",
            std::env::var("DEFAULT_K_FACTOR").ok(),
            DEFAULT_K_FACTOR,
        )?;
        anyhow::ensure!(default_k_factor > 0, "DEFAULT_K_FACTOR must be positive");

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                std::env::var("DATABASE_MAX_CONNECTIONS").ok(),
                10,
            )?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            sport_cache_ttl: Duration::from_secs(parse_or(
                "SPORT_CACHE_TTL_SECS",
                std::env::var("SPORT_CACHE_TTL_SECS").ok(),
                DEFAULT_CACHE_TTL.as_secs(),
            )?),
            default_k_factor,
        })
    }
}

/// Parses an optional setting, falling back to `default` when unset or blank.
fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .with_context(|| format!("{name} has an invalid value: {value}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_settings_fall_back_to_defaults() {
        assert_eq!(parse_or::<u64>("TTL", None, 300).unwrap(), 300);
        assert_eq!(parse_or::<u64>("TTL", Some("  ".into()), 300).unwrap(), 300);
        assert_eq!(parse_or::<u64>("TTL", Some("60".into()), 300).unwrap(), 60);
    }

    #[test]
    fn malformed_settings_name_the_variable() {
        let err = parse_or::<i32>("DEFAULT_K_FACTOR", Some("high".into()), 32).unwrap_err();
        assert!(err.to_string().contains("DEFAULT_K_FACTOR"));
    }
}
