//! Handles settings for the application.
//!
//! Values come from an optional `settings.toml` in the working directory,
//! overridden by `POCKETBOOK__*` environment variables (`__` separates
//! sections, e.g. `POCKETBOOK__SERVER__PORT=8080`).
//!
//! ```toml
//! [app]
//! level = "debug"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 3000
//!
//! database = { sqlite = "pocketbook.db" }
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_SQLITE_PATH: &str = "pocketbook.db";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

/// Where documents and users are stored.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// Throwaway in-memory SQLite database.
    Memory,
    /// SQLite file, created on first run.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    database: Option<Database>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(Environment::with_prefix("POCKETBOOK").separator("__")),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("app.level", "info")?
            .set_default("server.bind", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?
            .try_deserialize()
    }

    pub fn database(&self) -> Database {
        match &self.database {
            Some(Database::Memory) => Database::Memory,
            Some(Database::Sqlite(path)) => Database::Sqlite(path.clone()),
            None => Database::Sqlite(DEFAULT_SQLITE_PATH.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Settings::from_config(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
        .unwrap()
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(
            settings.database(),
            Database::Sqlite(DEFAULT_SQLITE_PATH.to_string())
        );
    }

    #[test]
    fn database_accepts_both_forms() {
        assert_eq!(parse("database = \"memory\"").database(), Database::Memory);
        assert_eq!(
            parse("database = { sqlite = \"/tmp/pb.db\" }").database(),
            Database::Sqlite("/tmp/pb.db".to_string())
        );
    }
}
