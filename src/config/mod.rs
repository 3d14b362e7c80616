use garde::Validate;
use serde::Deserialize;

#[derive(Debug, Deserialize, Validate)]
pub struct ReaperConfig {
    /// PostgreSQL connection string
    #[garde(length(min = 1))]
    pub database_url: String,

    /// Seconds without an update before an active job counts as a zombie
    #[serde(default = "default_zombie_threshold_secs")]
    #[garde(range(min = 1))]
    pub zombie_threshold_secs: u64,

    /// Seconds between reaper passes
    #[serde(default = "default_reap_interval_secs")]
    #[garde(range(min = 1))]
    pub reap_interval_secs: u64,
}

fn default_zombie_threshold_secs() -> u64 {
    900
}

fn default_reap_interval_secs() -> u64 {
    60
}

impl ReaperConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load from explicit `KEY=value` pairs (keys in SCREAMING_SNAKE_CASE).
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn zombie_threshold(&self) -> chrono::Duration {
        i64::try_from(self.zombie_threshold_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn reap_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.reap_interval_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}
