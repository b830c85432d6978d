use campflow_core::config::BookingRules;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub rules: BookingRules,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory for file-backed draft storage. Unset means drafts stay
    /// in memory for the process lifetime.
    #[serde(default)]
    pub draft_dir: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of CAMPFLOW)
            // Eg.. `CAMPFLOW_RULES__HOLD_SECONDS=300` overrides the hold TTL
            .add_source(config::Environment::with_prefix("CAMPFLOW").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
