//! Configuration loading and validation
//!
//! Sources are layered lowest to highest:
//! 1. Built-in defaults
//! 2. The first configuration file found (CLI path, then search paths)
//! 3. Environment variables, e.g. `FLAUNCH_DASH__FEED__ROWS_PER_PAGE=6`

use crate::error::{ConfigError, ConfigResult};
use crate::schema::DashboardConfig;
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "FLAUNCH_DASH";

/// Configuration loader
#[derive(Debug)]
pub struct ConfigLoader {
    /// Command-line specified config path
    cli_config_path: Option<PathBuf>,

    /// Environment variable prefix
    env_prefix: String,

    /// Search paths for configuration files
    search_paths: Vec<PathBuf>,

    default_config: DashboardConfig,

    /// Configuration sources that were used
    used_sources: Vec<String>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        let mut search_paths = vec![
            PathBuf::from("./flaunch-dash.json"),
            PathBuf::from("./flaunch-dash.yaml"),
        ];
        if let Some(path) = Self::user_config_path() {
            search_paths.push(path);
        }

        Self {
            cli_config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            search_paths,
            default_config: DashboardConfig::default(),
            used_sources: Vec::new(),
        }
    }

    /// Set command-line specified config path
    pub fn with_cli_config_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        self.cli_config_path = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Set environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Replace the search paths
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Add a search path
    pub fn add_search_path<P: AsRef<Path>>(&mut self, path: P) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    /// Set default configuration
    pub fn with_default_config(mut self, config: DashboardConfig) -> Self {
        self.default_config = config;
        self
    }

    /// Load configuration
    pub fn load(&mut self) -> ConfigResult<DashboardConfig> {
        debug!("Loading configuration");
        self.used_sources.clear();

        let mut builder = Config::builder().add_source(Config::try_from(&self.default_config)?);
        self.used_sources.push("default configuration".to_string());

        if let Some(path) = &self.cli_config_path {
            if !path.exists() {
                warn!("CLI-specified config file not found: {:?}", path);
                return Err(ConfigError::NotFound(path.clone()));
            }
            debug!("Loading configuration from CLI-specified path: {:?}", path);
            builder = Self::add_file_source(builder, path)?;
            self.used_sources.push(format!("CLI-specified config: {:?}", path));
        } else if let Some(path) = self.search_paths.iter().find(|p| p.exists()) {
            debug!("Loading configuration from: {:?}", path);
            builder = Self::add_file_source(builder, path)?;
            self.used_sources.push(format!("config file: {:?}", path));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );
        self.used_sources
            .push(format!("environment variables with prefix {}", self.env_prefix));

        let config: DashboardConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!("Configuration loaded from: {}", self.used_sources.join(", "));

        Ok(config)
    }

    /// Add a file source to the config builder
    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
    ) -> ConfigResult<ConfigBuilder<DefaultState>> {
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => FileFormat::Json,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            _ => {
                // Detect format from content
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
                        path: path.to_path_buf(),
                        source,
                    })?;
                if content.trim_start().starts_with('{') {
                    FileFormat::Json
                } else {
                    FileFormat::Yaml
                }
            }
        };

        Ok(builder.add_source(File::from(path).format(format).required(true)))
    }

    /// User configuration path, e.g. `~/.config/flaunch-dash/config.json`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flaunch-dash").join("config.json"))
    }

    /// Save configuration to a file, JSON unless the extension says YAML
    pub fn save_config(&self, config: &DashboardConfig, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(config)?,
            _ => serde_json::to_string_pretty(config)?,
        };
        std::fs::write(path, content)?;

        info!("Configuration saved to: {:?}", path);

        Ok(())
    }

    /// Get the sources that were used to load the configuration
    pub fn get_used_sources(&self) -> &[String] {
        &self.used_sources
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flaunch_dash_core::CoreError;
    use tempfile::tempdir;

    fn isolated(prefix: &str) -> ConfigLoader {
        ConfigLoader::default()
            .with_env_prefix(prefix)
            .with_search_paths(Vec::new())
    }

    #[test]
    fn test_config_loader_default() {
        let loader = ConfigLoader::default();
        assert_eq!(loader.env_prefix, "FLAUNCH_DASH");
        assert!(loader.search_paths.len() >= 2);
        assert!(loader.cli_config_path.is_none());
    }

    #[test]
    fn test_load_defaults() -> ConfigResult<()> {
        let mut loader = isolated("FLAUNCH_DASH_TEST_DEFAULTS");
        let config = loader.load()?;
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(loader.get_used_sources().len(), 2);
        Ok(())
    }

    #[test]
    fn test_save_and_load_config() -> ConfigResult<()> {
        let dir = tempdir()?;

        for name in ["config.json", "config.yaml"] {
            let config_path = dir.path().join(name);
            let mut config = DashboardConfig::default();
            config.feed.rows_per_page = 3;
            config.chart.tick_spacing = 200;
            config.network.chain = "base-sepolia".to_string();

            let loader = ConfigLoader::default();
            loader.save_config(&config, &config_path)?;

            let mut loader =
                isolated("FLAUNCH_DASH_TEST_SAVE").with_cli_config_path(Some(&config_path));
            let loaded = loader.load()?;
            assert_eq!(loaded, config);
            assert!(loader
                .get_used_sources()
                .iter()
                .any(|s| s.contains(&*config_path.to_string_lossy())));
        }

        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> ConfigResult<()> {
        let dir = tempdir()?;
        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "chart:\n  max_data_points: 30\n")?;

        let mut loader = isolated("FLAUNCH_DASH_TEST_PARTIAL");
        loader.add_search_path(&path);
        let config = loader.load()?;
        assert_eq!(config.chart.max_data_points, 30);
        assert_eq!(config.chart.tick_spacing, 60);
        assert_eq!(config.feed, DashboardConfig::default().feed);
        Ok(())
    }

    #[test]
    fn test_env_overrides_file() -> ConfigResult<()> {
        std::env::set_var("FLAUNCH_DASH_TEST_ENV__FEED__ROWS_PER_PAGE", "7");

        let mut loader = isolated("FLAUNCH_DASH_TEST_ENV");
        let config = loader.load()?;
        assert_eq!(config.feed.rows_per_page, 7);

        std::env::remove_var("FLAUNCH_DASH_TEST_ENV__FEED__ROWS_PER_PAGE");
        Ok(())
    }

    #[test]
    fn test_missing_cli_path_and_invalid_values() {
        let mut loader =
            isolated("FLAUNCH_DASH_TEST_MISSING").with_cli_config_path(Some("/nonexistent/x.json"));
        assert!(matches!(loader.load(), Err(ConfigError::NotFound(_))));

        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"network": {"chain": "solana"}}"#).unwrap();
        let mut loader = isolated("FLAUNCH_DASH_TEST_INVALID").with_cli_config_path(Some(&path));
        assert!(matches!(
            loader.load(),
            Err(ConfigError::Network(CoreError::UnknownChain(chain))) if chain == "solana"
        ));

        let path = dir.path().join("bad_rows.yaml");
        std::fs::write(&path, "feed:\n  rows_per_page: 0\n").unwrap();
        let mut loader = isolated("FLAUNCH_DASH_TEST_ROWS").with_cli_config_path(Some(&path));
        assert!(matches!(
            loader.load(),
            Err(ConfigError::InvalidSection { section: "feed", .. })
        ));
    }
}
