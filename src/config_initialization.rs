//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::toml_config::*;
use crate::cli::Cli;
use crate::engine::PipelineSettings;
use crate::error::PackError;
use crate::ports::ConfigPort;
use crate::utils::logging::LogLevel;
use crate::utils::path::PathUtils;

/// Environment variables and the config keys they override
pub const ENV_MAPPINGS: [(&str, &str); 6] = [
    ("HLSPACK_FFMPEG_PATH", KEY_FFMPEG_PATH),
    ("HLSPACK_WORK_ROOT", KEY_WORK_ROOT),
    ("HLSPACK_SEGMENT_DURATION", KEY_SEGMENT_DURATION),
    ("HLSPACK_KEY_URI", KEY_KEY_URI),
    ("HLSPACK_TIMEOUT_SECS", KEY_TIMEOUT_SECS),
    ("HLSPACK_LOG_LEVEL", KEY_LOG_LEVEL),
];

/// Outcome of resolving every configuration layer
#[derive(Debug, Clone)]
pub struct ResolvedConfiguration {
    pub settings: PipelineSettings,
    pub log_level: LogLevel,
    /// Config file that contributed values, if any
    pub config_file: Option<PathBuf>,
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub async fn initialize_configuration_hierarchy(cli: &Cli) -> Result<ResolvedConfiguration> {
    // Defaults are populated by the adapter itself.
    let config = TomlConfigAdapter::new();

    load_config_file(&config, cli.config.as_deref()).await?;
    load_environment_variables(&config, |name| std::env::var(name).ok()).await?;
    apply_cli_configuration_overrides(&config, cli).await?;

    config.validate_config().await.map_err(PackError::Config)?;

    let resolved = ResolvedConfiguration {
        settings: build_pipeline_settings(&config).await?,
        log_level: LogLevel::parse(&config.get_config_or_default(KEY_LOG_LEVEL, "info").await?)?,
        config_file: config.loaded_from(),
    };
    Ok(resolved)
}

/// Load configuration from file; an explicit path must exist
async fn load_config_file(config: &TomlConfigAdapter, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match PathUtils::default_config_path() {
            Some(path) => path,
            None => {
                debug!("No configuration file found, using defaults");
                return Ok(());
            }
        },
    };

    config
        .load_config(&path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Apply environment overrides read through `lookup`
pub async fn load_environment_variables<F>(config: &TomlConfigAdapter, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_overrides = 0;
    for (env_var, key) in ENV_MAPPINGS {
        if let Some(value) = lookup(env_var) {
            debug!("Environment override: {} = {}", env_var, value);
            config.set_config(key, &value).await?;
            env_overrides += 1;
        }
    }

    if env_overrides > 0 {
        debug!("Applied {} environment variable overrides", env_overrides);
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
pub async fn apply_cli_configuration_overrides(config: &TomlConfigAdapter, cli: &Cli) -> Result<()> {
    if let Some(level) = &cli.log_level {
        config.set_config(KEY_LOG_LEVEL, level).await?;
    }
    if let Some(work_root) = &cli.work_root {
        config
            .set_config(KEY_WORK_ROOT, &work_root.to_string_lossy())
            .await?;
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        config
            .set_config(KEY_FFMPEG_PATH, &ffmpeg.to_string_lossy())
            .await?;
    }
    if let Some(seconds) = cli.segment_duration {
        config
            .set_config(KEY_SEGMENT_DURATION, &seconds.to_string())
            .await?;
    }
    if let Some(seconds) = cli.timeout {
        config
            .set_config(KEY_TIMEOUT_SECS, &seconds.to_string())
            .await?;
    }
    Ok(())
}

/// Turn validated key/values into typed settings
pub async fn build_pipeline_settings(config: &TomlConfigAdapter) -> Result<PipelineSettings> {
    let defaults = PipelineSettings::default();

    let work_root = match config.get_config(KEY_WORK_ROOT).await? {
        Some(root) if !root.trim().is_empty() => PathBuf::from(root),
        _ => defaults.work_root,
    };
    let segment_duration = match config.get_config(KEY_SEGMENT_DURATION).await? {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid segment duration '{}'", raw))?,
        None => defaults.segment_duration,
    };
    let timeout_secs: u64 = match config.get_config(KEY_TIMEOUT_SECS).await? {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid timeout '{}'", raw))?,
        None => 0,
    };

    let settings = PipelineSettings {
        ffmpeg_path: config
            .get_config(KEY_FFMPEG_PATH)
            .await?
            .map(PathBuf::from)
            .unwrap_or(defaults.ffmpeg_path),
        work_root,
        segment_duration,
        key_uri: config
            .get_config(KEY_KEY_URI)
            .await?
            .unwrap_or(defaults.key_uri),
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
    };

    info!(
        ffmpeg = %settings.ffmpeg_path.display(),
        work_root = %settings.work_root.display(),
        segment_duration = settings.segment_duration,
        "Configuration resolved"
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["hlspack"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["package", "--input", "clip.mp4"]);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_produce_settings() {
        let config = TomlConfigAdapter::new();
        let settings = build_pipeline_settings(&config).await.unwrap();
        assert_eq!(settings.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(settings.segment_duration, 9);
        assert_eq!(settings.key_uri, "[LINK_TO_ENC_KEY_FILE]");
        assert!(settings.timeout.is_none());
        assert_eq!(settings.work_root, PathUtils::default_work_root());
    }

    #[tokio::test]
    async fn test_precedence_cli_over_env_over_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hlspack.toml");
        std::fs::write(
            &file,
            "[hlspack]\nsegment_duration = 4\nffmpeg_path = \"/file/ffmpeg\"\nkey_uri = \"https://file/key\"\n",
        )
        .unwrap();

        let config = TomlConfigAdapter::new();
        load_config_file(&config, Some(&file)).await.unwrap();

        let env: HashMap<&str, &str> = [
            ("HLSPACK_SEGMENT_DURATION", "6"),
            ("HLSPACK_FFMPEG_PATH", "/env/ffmpeg"),
        ]
        .into_iter()
        .collect();
        load_environment_variables(&config, |name| env.get(name).map(|v| v.to_string()))
            .await
            .unwrap();

        apply_cli_configuration_overrides(&config, &cli(&["--segment-duration", "12", "--timeout", "30"]))
            .await
            .unwrap();
        config.validate_config().await.unwrap();

        let settings = build_pipeline_settings(&config).await.unwrap();
        assert_eq!(settings.segment_duration, 12);
        assert_eq!(settings.ffmpeg_path, PathBuf::from("/env/ffmpeg"));
        assert_eq!(settings.key_uri, "https://file/key");
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_invalid_env_value_fails_validation() {
        let config = TomlConfigAdapter::new();
        load_environment_variables(&config, |name| {
            (name == "HLSPACK_SEGMENT_DURATION").then(|| "0".to_string())
        })
        .await
        .unwrap();
        assert!(config.validate_config().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_explicit_config_file_is_error() {
        let dir = TempDir::new().unwrap();
        let config = TomlConfigAdapter::new();
        assert!(load_config_file(&config, Some(&dir.path().join("absent.toml")))
            .await
            .is_err());
    }
}
