use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid --db value: {raw}")]
    InvalidDbUrl { raw: String },

    #[error("failed to prepare database file: {0}")]
    Io(#[from] std::io::Error),
}

/// Course progress HTTP server.
#[derive(Debug, Clone, Parser)]
#[command(name = "course-server", version, about)]
pub struct Config {
    /// SQLite database URL or file path.
    #[arg(long = "db", env = "COURSE_DB_URL", default_value = "sqlite://course.sqlite3")]
    pub db_url: String,

    /// Interface to bind.
    #[arg(long, env = "COURSE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "COURSE_PORT", default_value_t = 8080)]
    pub port: u16,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Normalizes the database URL and makes sure its file exists.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        if self.db_url.trim().is_empty() {
            return Err(ConfigError::InvalidDbUrl {
                raw: self.db_url.clone(),
            });
        }
        let url = normalize_sqlite_url(&self.db_url);
        prepare_sqlite_file(&url)?;
        Ok(url)
    }
}

/// Turns a bare or `sqlite:` relative path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_in_memory(trimmed) || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn is_in_memory(db_url: &str) -> bool {
    db_url == "sqlite::memory:" || db_url.contains("mode=memory")
}

/// Creates the database file and its parent directories if missing.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    if is_in_memory(db_url) {
        return Ok(());
    }

    let invalid = || ConfigError::InvalidDbUrl {
        raw: db_url.to_owned(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let config = Config::try_parse_from(["course-server"]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "course-server",
            "--db",
            "sqlite::memory:",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.database_url().unwrap(), "sqlite::memory:");
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/course.db");
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/course.db"));
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/x.db"), "sqlite:///tmp/x.db");
        let shared = "sqlite:file:demo?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(shared), shared);
    }

    #[test]
    fn prepare_creates_missing_file() {
        let dir = std::env::temp_dir().join(format!("course-config-{}", std::process::id()));
        let file = dir.join("nested").join("db.sqlite3");
        let url = format!("sqlite://{}", file.display());

        prepare_sqlite_file(&url).unwrap();
        assert!(file.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_non_sqlite_urls() {
        let err = prepare_sqlite_file("postgres://localhost/db").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDbUrl { .. }));
    }
}
