//! Settings: built-in defaults, then `antrean.toml`, then `ANTREAN_*` env vars

use antrean_core::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "~/.antrean/antrean.db";
const DEFAULT_CONFIG_FILE: &str = "antrean";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub poll_interval_ms: u64,
    pub shop_name: String,
    pub speech_program: String,
    pub speech_timeout_ms: u64,
    pub voices: Vec<String>,
}

impl Settings {
    /// Load layered settings. `file` replaces the default `antrean.toml` lookup.
    pub fn load(file: Option<PathBuf>) -> Result<Self> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)
            .and_then(|b| b.set_default("poll_interval_ms", 250))
            .and_then(|b| b.set_default("shop_name", antrean_core::domain::DEFAULT_SHOP_NAME))
            .and_then(|b| {
                b.set_default(
                    "speech_program",
                    antrean_infra_system::DEFAULT_SPEECH_PROGRAM,
                )
            })
            .and_then(|b| b.set_default("speech_timeout_ms", 30_000))
            .and_then(|b| b.set_default("voices", Vec::<String>::new()))
            .map_err(config_error)?
            .add_source(file_source)
            .add_source(
                Environment::with_prefix("ANTREAN")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("voices"),
            )
            .build()
            .map_err(config_error)?;

        config.try_deserialize().map_err(config_error)
    }

    /// Database path with `~` and `$VARS` expanded
    pub fn expanded_db_path(&self) -> Result<String> {
        shellexpand::full(&self.db_path)
            .map(|p| p.into_owned())
            .map_err(|e| AppError::Config(format!("db_path: {}", e)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn speech_timeout(&self) -> Duration {
        Duration::from_millis(self.speech_timeout_ms)
    }
}

fn config_error(err: config::ConfigError) -> AppError {
    AppError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.poll_interval(), Duration::from_millis(250));
        assert_eq!(settings.shop_name, "kaibete motor");
        assert_eq!(settings.speech_program, "espeak-ng");
        assert!(!settings.expanded_db_path().unwrap().starts_with('~'));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("antrean-settings-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "shop_name = \"bengkel jaya\"\npoll_interval_ms = 100\nvoices = [\"id\"]").unwrap();

        let settings = Settings::load(Some(path.clone())).unwrap();
        assert_eq!(settings.shop_name, "bengkel jaya");
        assert_eq!(settings.poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.voices, vec!["id".to_string()]);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let err = Settings::load(Some(PathBuf::from("/nonexistent/antrean.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
