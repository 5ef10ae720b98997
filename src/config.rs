use crate::error::RosterError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "ROSTER_";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:db/students.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub loglevel: String,
    /// Start the console after bootstrap.
    pub interactive: bool,
    pub history_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            loglevel: "info".to_string(),
            interactive: true,
            history_file: None,
        }
    }
}

impl Config {
    /// Defaults overlaid with `ROSTER_*` environment variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Any unparsable setting is an error; nothing falls back silently.
    pub fn load() -> Result<Self, RosterError> {
        Ok(Self::figment().extract()?)
    }
}
