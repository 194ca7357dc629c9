use serde::{Deserialize, Serialize};

/// Fixed store configuration, persisted between runs through eframe
/// storage alongside the rest of the app state.
#[derive(Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // mode=rwc creates the database file on first launch.
            database_url: "sqlite://bank.db?mode=rwc".to_owned(),
        }
    }
}
