use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Duration, Utc};

use guestbook_api::state::{DEFAULT_DUPLICATE_WINDOW_SECS, DEFAULT_PAGE_SIZE, Settings};

/// Server configuration, read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path: PathBuf = lookup("GUESTBOOK_DB_PATH")
            .unwrap_or_else(|| "guestbook.db".into())
            .into();
        let host = lookup("GUESTBOOK_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("GUESTBOOK_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("GUESTBOOK_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

        let page_size: u32 = match lookup("GUESTBOOK_PAGE_SIZE") {
            Some(v) => v.parse().context("GUESTBOOK_PAGE_SIZE must be a positive integer")?,
            None => DEFAULT_PAGE_SIZE,
        };
        if page_size == 0 {
            bail!("GUESTBOOK_PAGE_SIZE must be at least 1");
        }

        let window_secs: i64 = match lookup("GUESTBOOK_DUPLICATE_WINDOW_SECS") {
            Some(v) => v
                .parse()
                .context("GUESTBOOK_DUPLICATE_WINDOW_SECS must be a number of seconds")?,
            None => DEFAULT_DUPLICATE_WINDOW_SECS,
        };
        if window_secs < 0 {
            bail!("GUESTBOOK_DUPLICATE_WINDOW_SECS cannot be negative");
        }
        let duplicate_window = Duration::try_seconds(window_secs)
            .filter(|window| Utc::now().checked_sub_signed(*window).is_some())
            .with_context(|| {
                format!("GUESTBOOK_DUPLICATE_WINDOW_SECS is out of range: {}", window_secs)
            })?;

        Ok(Self {
            db_path,
            addr,
            settings: Settings {
                page_size,
                duplicate_window,
            },
        })
    }
}
