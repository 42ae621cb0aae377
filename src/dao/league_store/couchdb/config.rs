use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::error::{CouchDaoError, CouchResult};

/// Database used when `COUCH_DB` is not set.
pub const DEFAULT_DATABASE: &str = "padel_league";

// CouchDB naming rule: lowercase letter first, then lowercase letters, digits and `_$()+-/`.
static DATABASE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_$()+/-]*$").expect("database name pattern is a valid regex")
});

/// Where the league documents live and how to authenticate against CouchDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    /// Server root, `http(s)://host:port`, without a trailing slash.
    pub base_url: String,
    /// Database holding every league document.
    pub database: String,
    /// Basic-auth user, set together with `password`.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
}

impl CouchConfig {
    /// Validated configuration for `database` on the server at `base_url`.
    pub fn new(base_url: &str, database: &str) -> CouchResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CouchDaoError::InvalidConfig {
                reason: format!("base URL `{base_url}` must start with http:// or https://"),
            });
        }

        let database = database.trim();
        if !DATABASE_NAME.is_match(database) {
            return Err(CouchDaoError::InvalidConfig {
                reason: format!("`{database}` is not a valid CouchDB database name"),
            });
        }

        Ok(Self {
            base_url: base_url.to_string(),
            database: database.to_string(),
            username: None,
            password: None,
        })
    }

    /// Attach basic-auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Read `COUCH_BASE_URL` (required), `COUCH_DB` and the optional credentials
    /// from the process environment.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let base_url = lookup("COUCH_BASE_URL").ok_or(CouchDaoError::MissingEnvVar {
            var: "COUCH_BASE_URL",
        })?;
        let database = lookup("COUCH_DB")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let config = Self::new(&base_url, &database)?;

        match (lookup("COUCH_USERNAME"), lookup("COUCH_PASSWORD")) {
            (Some(username), Some(password)) => Ok(config.with_credentials(username, password)),
            (None, None) => Ok(config),
            _ => {
                warn!("only one of COUCH_USERNAME / COUCH_PASSWORD is set; connecting without credentials");
                Ok(config)
            }
        }
    }
}
