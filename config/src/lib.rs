//! Configuration for the umroh back-office tools.
//!
//! Read from `~/.umroh/config.toml` (or the file named by `UMROH_CONFIG`):
//!
//! ```toml
//! [query]
//! max_retries = 2
//! retry_delay_ms = 1000
//! error_message = "Gagal memuat data"
//!
//! [database]
//! url = "https://project.example.co"
//! anon_key = "${UMROH_ANON_KEY}"
//! ```

use serde::Deserialize;
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use umroh_query::QueryOptions;

pub const CONFIG_PATH_ENV: &str = "UMROH_CONFIG";
pub const DATABASE_URL_ENV: &str = "UMROH_DATABASE_URL";
pub const DATABASE_ANON_KEY_ENV: &str = "UMROH_DATABASE_ANON_KEY";

#[derive(Debug, Default, Deserialize)]
pub struct UmrohConfig {
    pub query: Option<QueryConfig>,
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("database {key} is not configured (set [database].{key} or {env})")]
    MissingDatabase {
        key: &'static str,
        env: &'static str,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => {
                Some(path.as_path())
            }
            ConfigError::MissingDatabase { .. } => None,
        }
    }
}

/// Retry settings for data loads. Unset fields keep the executor defaults.
#[derive(Debug, Default, Deserialize)]
pub struct QueryConfig {
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub error_message: Option<String>,
}

impl QueryConfig {
    #[must_use]
    pub fn to_options(&self) -> QueryOptions {
        let mut options = QueryOptions::default();
        if let Some(max_retries) = self.max_retries {
            options = options.with_max_retries(max_retries);
        }
        if let Some(ms) = self.retry_delay_ms {
            options = options.with_retry_delay(Duration::from_millis(ms));
        }
        if let Some(message) = self
            .error_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
        {
            options = options.with_error_message(message);
        }
        options
    }
}

/// Hosted database endpoint. Values may reference env vars as `${VAR}`.
#[derive(Default, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

// Manual Debug impl to prevent leaking the key in logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field(
                "anon_key",
                &if self.anon_key.is_some() {
                    "[REDACTED]"
                } else {
                    "None"
                },
            )
            .finish()
    }
}

/// Fully resolved database endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: String,
    pub anon_key: String,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// Expand `${VAR}` references; unset variables expand to nothing.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn resolve_value(configured: Option<&str>, env_key: &str) -> Option<String> {
    configured
        .map(expand_env_vars)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| env::var(env_key).ok().filter(|v| !v.trim().is_empty()))
}

impl UmrohConfig {
    /// Load the config file.
    ///
    /// Returns `Ok(None)` when no config file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::from_toml_str(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn query_options(&self) -> QueryOptions {
        self.query
            .as_ref()
            .map(QueryConfig::to_options)
            .unwrap_or_default()
    }

    /// Resolve the database endpoint from the file, then the environment.
    pub fn database(&self) -> Result<DatabaseSettings, ConfigError> {
        let db = self.database.as_ref();
        let url = resolve_value(db.and_then(|d| d.url.as_deref()), DATABASE_URL_ENV).ok_or(
            ConfigError::MissingDatabase {
                key: "url",
                env: DATABASE_URL_ENV,
            },
        )?;
        let anon_key = resolve_value(
            db.and_then(|d| d.anon_key.as_deref()),
            DATABASE_ANON_KEY_ENV,
        )
        .ok_or(ConfigError::MissingDatabase {
            key: "anon_key",
            env: DATABASE_ANON_KEY_ENV,
        })?;

        Ok(DatabaseSettings {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }
}

/// `$UMROH_CONFIG` if set, else `~/.umroh/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".umroh").join("config.toml"))
}
