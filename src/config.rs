use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v4 read access token (bearer)
    #[serde(default)]
    pub tmdb_token: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Base URL that image paths are resolved against
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// File backing the local ratings and reviews
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_storage_path() -> String {
    "cinescope-storage.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_token: None,
            tmdb_api_url: default_tmdb_api_url(),
            tmdb_image_url: default_tmdb_image_url(),
            storage_path: default_storage_path(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// The trimmed token, or `None` when unset or blank.
    pub fn token(&self) -> Option<&str> {
        self.tmdb_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Logs a startup warning when no credential is configured.
    ///
    /// Startup continues; every catalog request will fail as unauthorized.
    pub fn warn_if_unauthenticated(&self) -> bool {
        if self.token().is_none() {
            tracing::warn!(
                "TMDB_TOKEN is not set; catalog requests will fail with an authentication error"
            );
            return true;
        }
        false
    }
}
