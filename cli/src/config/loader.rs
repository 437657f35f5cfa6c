//! Engine configuration discovery
//!
//! The first file found wins, then command-line flags are applied on top:
//! 1. `--config` file, or `config.json` inside a `--config` directory
//! 2. `./wox.json`, then `./.wox/config.json`
//! 3. `<config dir>/wox/config.json`
//! 4. built-in defaults

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use wox_core::storage::RecordStores;
use wox_core::EngineConfig;

const CONFIG_FILE_NAME: &str = "config.json";

/// Resolves an [`EngineConfig`] for the `wox` binary
#[derive(Debug, Default)]
pub struct CliConfigLoader {
    /// Explicit `--config` path; skips discovery
    config_path: Option<PathBuf>,
    storage_dir_override: Option<PathBuf>,
    max_results_override: Option<usize>,
    disabled_plugins_override: Vec<String>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `path` instead of searching for a config file
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Set storage directory override
    pub fn with_storage_dir_override(mut self, dir: PathBuf) -> Self {
        self.storage_dir_override = Some(dir);
        self
    }

    /// Set visible result count override
    pub fn with_max_results_override(mut self, max_results: usize) -> Self {
        self.max_results_override = Some(max_results);
        self
    }

    /// Disable additional plugins
    pub fn with_disabled_plugins(mut self, plugins: Vec<String>) -> Self {
        self.disabled_plugins_override = plugins;
        self
    }

    /// Find the config file, apply flag overrides and validate
    pub async fn load(&self) -> Result<EngineConfig> {
        let mut config = match &self.config_path {
            Some(path) => self
                .read_explicit(path)
                .await
                .with_context(|| format!("Cannot use config {}", path.display()))?,
            None => self.discover().await?,
        };

        if let Some(dir) = &self.storage_dir_override {
            config.storage_dir = Some(dir.clone());
        }
        if let Some(max_results) = self.max_results_override {
            config.max_results_to_show = max_results;
        }
        for plugin in &self.disabled_plugins_override {
            if !config.disabled_plugins.contains(plugin) {
                config.disabled_plugins.push(plugin.clone());
            }
        }

        let storage_dir = match config.storage_dir.take() {
            Some(dir) => expand_path(&dir),
            None => RecordStores::default_dir(),
        };
        config.storage_dir = Some(storage_dir);

        config
            .validate()
            .map_err(|e| anyhow!("Configuration failed validation: {}", e))?;

        Ok(config)
    }

    /// First existing candidate file, or defaults
    async fn discover(&self) -> Result<EngineConfig> {
        for candidate in candidate_files()? {
            if candidate.is_file() {
                return read_config(&candidate).await;
            }
        }

        debug!("No config file found, using defaults");
        Ok(EngineConfig::default())
    }

    /// A file, or a directory holding `config.json`
    async fn read_explicit(&self, path: &Path) -> Result<EngineConfig> {
        if path.is_file() {
            return read_config(path).await;
        }
        if !path.is_dir() {
            return Err(anyhow!("{} does not exist", path.display()));
        }

        let file = path.join(CONFIG_FILE_NAME);
        if !file.is_file() {
            return Err(anyhow!("{} has no {}", path.display(), CONFIG_FILE_NAME));
        }
        read_config(&file).await
    }
}

/// Discovery order below the explicit path
fn candidate_files() -> Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("Cannot read the working directory")?;
    let mut candidates = vec![
        cwd.join("wox.json"),
        cwd.join(".wox").join(CONFIG_FILE_NAME),
    ];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("wox").join(CONFIG_FILE_NAME));
    }
    Ok(candidates)
}

async fn read_config(path: &Path) -> Result<EngineConfig> {
    debug!("Reading config {}", path.display());
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a valid config", path.display()))
}

/// Expand a leading `~` in a configured path
fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => PathBuf::from(shellexpand::tilde(text).into_owned()),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_override_file_and_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(
            &path,
            r#"{ "max_results_to_show": 8, "disabled_plugins": ["system"] }"#,
        )
        .unwrap();

        let config = CliConfigLoader::new()
            .with_config_override(path)
            .with_storage_dir_override(dir.path().join("data"))
            .with_disabled_plugins(vec!["system".to_string(), "calculator".to_string()])
            .load()
            .await
            .unwrap();

        assert_eq!(config.max_results_to_show, 8);
        assert_eq!(config.selection_boost, 10);
        assert_eq!(config.disabled_plugins, vec!["system", "calculator"]);
        assert_eq!(config.storage_dir, Some(dir.path().join("data")));
    }

    #[tokio::test]
    async fn test_directory_override_uses_config_json() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{ "history_limit": 20 }"#).unwrap();

        let config = CliConfigLoader::new()
            .with_config_override(dir.path().to_path_buf())
            .with_max_results_override(3)
            .load()
            .await
            .unwrap();

        assert_eq!(config.history_limit, 20);
        assert_eq!(config.max_results_to_show, 3);
        assert!(config.storage_dir.is_some());
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "refresh_cycle_ms": 0 }"#).unwrap();

        let result = CliConfigLoader::new().with_config_override(path).load().await;
        assert!(result.is_err());

        let missing = CliConfigLoader::new()
            .with_config_override(dir.path().join("missing.json"))
            .load()
            .await;
        assert!(missing.is_err());
    }

    #[test]
    fn test_tilde_expansion() {
        let expanded = expand_path(Path::new("~/wox-data"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with("wox-data"));
    }
}
