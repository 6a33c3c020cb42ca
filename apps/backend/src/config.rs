//! Runtime configuration read from the environment

use anyhow::Context;
use toc_core::{DEFAULT_RENUMBER_OFFSET, MAX_CHAPTER_NUMBER};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    /// Minimum offset for the reorder bump phase
    pub reorder_offset: i32,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 3000)?;
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 10)?;
        let reorder_offset = check_reorder_offset(parse_var("REORDER_OFFSET", DEFAULT_RENUMBER_OFFSET)?)?;

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            reorder_offset,
        })
    }

    /// Address to bind the HTTP listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The bump phase adds the offset to numbers up to `MAX_CHAPTER_NUMBER`.
fn check_reorder_offset(offset: i32) -> anyhow::Result<i32> {
    let ceiling = i32::MAX - MAX_CHAPTER_NUMBER;
    if offset <= 0 || offset > ceiling {
        anyhow::bail!("REORDER_OFFSET must be between 1 and {}, got {}", ceiling, offset);
    }
    Ok(offset)
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {}: {}", name, raw)),
        Err(_) => Ok(default),
    }
}
