// Runtime configuration, read from the environment (and `.env` via dotenv).

use thiserror::Error;

pub const DEFAULT_DATABASE_PATH: &str = "data/board.db";
pub const DEFAULT_LOCAL_USER: &str = "local-user";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Unknown BACKEND {0:?} (expected \"supabase\" or \"sqlite\")")]
    UnknownBackend(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Supabase {
        url: String,
        anon_key: String,
        /// Optional password login performed at startup.
        credentials: Option<(String, String)>,
    },
    Sqlite {
        database_path: String,
        /// The offline backend has no auth server; this id acts as the user.
        local_user: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub avatar_bucket: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("BACKEND").as_deref().unwrap_or("sqlite") {
            "supabase" => BackendConfig::Supabase {
                url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                anon_key: get("SUPABASE_ANON_KEY")
                    .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
                credentials: get("SUPABASE_EMAIL").zip(get("SUPABASE_PASSWORD")),
            },
            "sqlite" => BackendConfig::Sqlite {
                database_path: get("DATABASE_PATH")
                    .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
                local_user: get("LOCAL_USER_ID").unwrap_or_else(|| DEFAULT_LOCAL_USER.to_string()),
            },
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self {
            backend,
            avatar_bucket: get("AVATAR_BUCKET")
                .unwrap_or_else(|| crate::core::avatar::avatar_service::DEFAULT_BUCKET.to_string()),
        })
    }
}
