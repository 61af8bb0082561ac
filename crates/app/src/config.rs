use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_STALE_AFTER_HOURS: i64 = 24;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid {var} value: {raw}")]
    Invalid { var: &'static str, raw: String },
    #[error("could not prepare database file {path}: {source}")]
    DatabaseFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runtime settings, read from `QUIZ_*` variables and overridable from the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub bind_addr: SocketAddr,
    /// `None` locks every admin route.
    pub admin_key: Option<String>,
    pub stale_after: Duration,
}

impl Config {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an unparsable address or retention.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an unparsable address or retention.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_url = lookup("QUIZ_DB_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_URL.to_owned());
        let db_url = normalize_sqlite_url(db_url);

        let bind_addr = parse_addr(
            lookup("QUIZ_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            "QUIZ_BIND_ADDR",
        )?;

        let admin_key = lookup("QUIZ_ADMIN_KEY").filter(|v| !v.is_empty());

        let stale_after = match lookup("QUIZ_STALE_AFTER_HOURS") {
            None => Duration::hours(DEFAULT_STALE_AFTER_HOURS),
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| (1..=24 * 365).contains(h))
                .map(Duration::hours)
                .ok_or(ConfigError::Invalid {
                    var: "QUIZ_STALE_AFTER_HOURS",
                    raw,
                })?,
        };

        Ok(Self {
            db_url,
            bind_addr,
            admin_key,
            stale_after,
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `raw` is not a socket address.
    pub fn set_bind_addr(&mut self, raw: String) -> Result<(), ConfigError> {
        self.bind_addr = parse_addr(raw, "--addr")?;
        Ok(())
    }

    pub fn set_db_url(&mut self, raw: String) {
        self.db_url = normalize_sqlite_url(raw);
    }
}

fn parse_addr(raw: String, var: &'static str) -> Result<SocketAddr, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, raw })
}

/// Turn a bare path or `sqlite:` URL into a `sqlite://` URL with an absolute
/// path. In-memory URLs and query parameters pass through untouched.
#[must_use]
pub fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite:file:") {
        return trimmed.to_owned();
    }

    let rest = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    if path_str.is_empty() || path_str == ":memory:" {
        return trimmed.to_owned();
    }

    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    }
}

/// Create the database file and its parent directories so `SQLite` can open it.
///
/// In-memory URLs are left alone.
///
/// # Errors
///
/// Returns `ConfigError::DatabaseFile` if the path cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    let Some(rest) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    let path = Path::new(path);
    let io_err = |source| ConfigError::DatabaseFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;
    }
    Ok(())
}
