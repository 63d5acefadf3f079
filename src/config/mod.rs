//! Configuration management for database and application settings.

/// Database configuration and connection management
pub mod database;

/// Seed configuration loading from config.toml
pub mod seed;

use crate::errors::Result;

/// Application configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,
    /// Path to the seed configuration file
    pub seed_path: String,
}

/// Loads the application configuration from environment variables, falling
/// back to local defaults: a `SQLite` file under `data/` and `config.toml`
/// in the working directory.
pub fn load_app_configuration() -> Result<AppConfig> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| database::DEFAULT_DATABASE_URL.to_string());
    let seed_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

    Ok(AppConfig {
        database_url,
        seed_path,
    })
}
