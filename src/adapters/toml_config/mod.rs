// TOML config adapter - Configuration management using TOML files

use crate::domain::errors::*;
use crate::domain::rules::JobRules;
use crate::ports::*;
use crate::utils::logging::LogLevel;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Table holding hlspack settings inside a config file
const CONFIG_SECTION: &str = "hlspack";

pub const KEY_FFMPEG_PATH: &str = "ffmpeg_path";
pub const KEY_WORK_ROOT: &str = "work_root";
pub const KEY_SEGMENT_DURATION: &str = "segment_duration";
pub const KEY_KEY_URI: &str = "key_uri";
pub const KEY_TIMEOUT_SECS: &str = "timeout_secs";
pub const KEY_LOG_LEVEL: &str = "log_level";

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    config: Arc<RwLock<HashMap<String, String>>>,
    config_file_path: Arc<RwLock<Option<PathBuf>>>,
}

impl TomlConfigAdapter {
    /// Create new TOML config adapter populated with defaults
    pub fn new() -> Self {
        let mut config = HashMap::new();
        for (key, value) in Self::defaults() {
            config.insert(key.to_string(), value.to_string());
        }

        Self {
            config: Arc::new(RwLock::new(config)),
            config_file_path: Arc::new(RwLock::new(None)),
        }
    }

    /// Default configuration values
    fn defaults() -> [(&'static str, &'static str); 5] {
        [
            (KEY_FFMPEG_PATH, "ffmpeg"),
            (KEY_SEGMENT_DURATION, "9"),
            (KEY_KEY_URI, crate::domain::model::DEFAULT_KEY_URI),
            (KEY_TIMEOUT_SECS, "0"),
            (KEY_LOG_LEVEL, "info"),
        ]
    }

    /// Path of the file most recently loaded, if any
    pub fn loaded_from(&self) -> Option<PathBuf> {
        self.config_file_path
            .read()
            .ok()
            .and_then(|path| path.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, String>>, DomainError> {
        self.config
            .read()
            .map_err(|_| DomainError::BadArgs("Configuration store is poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, String>>, DomainError> {
        self.config
            .write()
            .map_err(|_| DomainError::BadArgs("Configuration store is poisoned".to_string()))
    }

    /// Deserialize config from TOML string
    fn deserialize_config(&self, toml_content: &str) -> Result<(), DomainError> {
        let parsed: toml::Value = toml::from_str(toml_content)
            .map_err(|e| DomainError::BadArgs(format!("Failed to parse TOML config: {}", e)))?;

        let mut config = self.write()?;
        if let Some(table) = parsed.get(CONFIG_SECTION).and_then(|s| s.as_table()) {
            for (key, value) in table {
                // Numbers are accepted unquoted.
                let rendered = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    other => {
                        return Err(DomainError::BadArgs(format!(
                            "Unsupported value for {}: {}",
                            key, other
                        )))
                    }
                };
                config.insert(key.clone(), rendered);
            }
        }

        Ok(())
    }
}

impl Default for TomlConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigPort for TomlConfigAdapter {
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError> {
        Ok(self
            .read()?
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.write()?.insert(key.to_string(), value.to_string());
        tracing::debug!("Set config {} = {}", key, value);
        Ok(())
    }

    async fn load_config(&self, file_path: &Path) -> Result<(), DomainError> {
        let content = std::fs::read_to_string(file_path).map_err(|e| {
            DomainError::io(format!("read config file {}", file_path.display()), e)
        })?;

        self.deserialize_config(&content)?;
        if let Ok(mut config_path) = self.config_file_path.write() {
            *config_path = Some(file_path.to_path_buf());
        }

        Ok(())
    }

    async fn validate_config(&self) -> Result<(), DomainError> {
        let config = self.read()?;

        if let Some(log_level) = config.get(KEY_LOG_LEVEL) {
            LogLevel::parse(log_level)?;
        }

        if let Some(duration) = config.get(KEY_SEGMENT_DURATION) {
            let seconds: u32 = duration.parse().map_err(|e| {
                DomainError::BadArgs(format!("Invalid segment duration '{}': {}", duration, e))
            })?;
            JobRules::validate_segment_duration(seconds)?;
        }

        if let Some(timeout) = config.get(KEY_TIMEOUT_SECS) {
            timeout.parse::<u64>().map_err(|e| {
                DomainError::BadArgs(format!("Invalid timeout '{}': {}", timeout, e))
            })?;
        }

        for key in [KEY_FFMPEG_PATH, KEY_KEY_URI] {
            if config.get(key).is_some_and(|v| v.trim().is_empty()) {
                return Err(DomainError::BadArgs(format!("{} cannot be empty", key)));
            }
        }

        // The key uri becomes one descriptor line.
        if config.get(KEY_KEY_URI).is_some_and(|v| v.contains('\n')) {
            return Err(DomainError::BadArgs(
                "key_uri must be a single line".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_defaults() {
        let config = TomlConfigAdapter::new();
        assert_eq!(config.get_config(KEY_FFMPEG_PATH).await.unwrap().as_deref(), Some("ffmpeg"));
        assert_eq!(config.get_config(KEY_SEGMENT_DURATION).await.unwrap().as_deref(), Some("9"));
        assert_eq!(
            config.get_config(KEY_KEY_URI).await.unwrap().as_deref(),
            Some("[LINK_TO_ENC_KEY_FILE]")
        );
        assert!(config.get_config(KEY_WORK_ROOT).await.unwrap().is_none());
        assert!(config.validate_config().await.is_ok());
    }

    #[tokio::test]
    async fn test_load_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hlspack.toml");
        std::fs::write(
            &path,
            "[hlspack]\nffmpeg_path = \"/opt/ffmpeg/bin/ffmpeg\"\nsegment_duration = 6\n",
        )
        .unwrap();

        let config = TomlConfigAdapter::new();
        config.load_config(&path).await.unwrap();

        assert_eq!(
            config.get_config(KEY_FFMPEG_PATH).await.unwrap().as_deref(),
            Some("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.get_config(KEY_SEGMENT_DURATION).await.unwrap().as_deref(), Some("6"));
        assert_eq!(config.loaded_from(), Some(path));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let config = TomlConfigAdapter::new();
        let err = config
            .load_config(Path::new("/nonexistent/hlspack.toml"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
    }

    #[tokio::test]
    async fn test_malformed_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[hlspack\n").unwrap();
        let config = TomlConfigAdapter::new();
        assert!(config.load_config(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_values() {
        let config = TomlConfigAdapter::new();
        config.set_config(KEY_SEGMENT_DURATION, "0").await.unwrap();
        assert!(config.validate_config().await.is_err());

        config.set_config(KEY_SEGMENT_DURATION, "9").await.unwrap();
        config.set_config(KEY_TIMEOUT_SECS, "soon").await.unwrap();
        assert!(config.validate_config().await.is_err());

        config.set_config(KEY_TIMEOUT_SECS, "60").await.unwrap();
        config.set_config(KEY_LOG_LEVEL, "loud").await.unwrap();
        assert!(config.validate_config().await.is_err());

        config.set_config(KEY_LOG_LEVEL, "debug").await.unwrap();
        config.set_config(KEY_KEY_URI, "a\nb").await.unwrap();
        assert!(config.validate_config().await.is_err());
    }
}
