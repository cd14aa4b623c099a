use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub query: QueryConfig,
    pub file_loading: FileLoadingConfig,
    pub recents: RecentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Name users write in SQL to refer to the loaded file
    pub virtual_table_name: String,
    /// Rows per result page
    pub page_size: usize,
    /// Upper bound the revisor clamps LIMIT values to
    pub max_rows: usize,
    /// Query run when none is given; supports $(table) and $(limit)
    pub default_query: String,
    pub history_limit: usize,
    pub enable_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoadingConfig {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
    pub compression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentsConfig {
    pub enabled: bool,
    /// Maximum number of entries kept in the recents list
    pub limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.3".to_string(),
            query: QueryConfig::default(),
            file_loading: FileLoadingConfig::default(),
            recents: RecentsConfig::default(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            virtual_table_name: "data".to_string(),
            page_size: 100,
            max_rows: 10_000,
            default_query: "SELECT * FROM $(table)".to_string(),
            history_limit: 1000,
            enable_history: true,
        }
    }
}

impl Default for RecentsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let mut config = AppConfig::default();

        // Try to load user config (if exists)
        if let Ok(user_config) = Self::load_user_config(app_name) {
            config.merge(user_config);
        }

        config.validate()?;

        Ok(config)
    }

    /// Load user configuration from ~/.config/parvu/config.toml
    fn load_user_config(app_name: &str) -> Result<AppConfig> {
        let config_manager = ConfigManager::new(app_name)?;
        let config_path = config_manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.query.merge(other.query);
        self.file_loading.merge(other.file_loading);
        self.recents.merge(other.recents);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.3") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.3.x",
                self.version
            ));
        }

        if self.query.page_size == 0 {
            return Err(eyre!("page_size must be greater than 0"));
        }

        if self.query.max_rows == 0 {
            return Err(eyre!("max_rows must be greater than 0"));
        }

        if !is_identifier(&self.query.virtual_table_name) {
            return Err(eyre!(
                "virtual_table_name {:?} must be a plain identifier (letters, digits, underscores)",
                self.query.virtual_table_name
            ));
        }

        if let Some(compression) = &self.file_loading.compression {
            match compression.as_str() {
                "gzip" | "zstd" | "bzip2" | "xz" => {}
                other => {
                    return Err(eyre!(
                        "Invalid compression: {}. Must be gzip, zstd, bzip2 or xz",
                        other
                    ))
                }
            }
        }

        Ok(())
    }

    /// Render $(table) and $(limit) placeholders in a query string
    pub fn render_vars(&self, query: &str) -> String {
        query
            .replace("$(table)", &self.query.virtual_table_name)
            .replace("$(limit)", &self.query.max_rows.to_string())
    }
}

impl QueryConfig {
    pub fn merge(&mut self, other: Self) {
        let default = QueryConfig::default();
        if other.virtual_table_name != default.virtual_table_name {
            self.virtual_table_name = other.virtual_table_name;
        }
        if other.page_size != default.page_size {
            self.page_size = other.page_size;
        }
        if other.max_rows != default.max_rows {
            self.max_rows = other.max_rows;
        }
        if other.default_query != default.default_query {
            self.default_query = other.default_query;
        }
        if other.history_limit != default.history_limit {
            self.history_limit = other.history_limit;
        }
        if other.enable_history != default.enable_history {
            self.enable_history = other.enable_history;
        }
    }
}

impl FileLoadingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.has_header.is_some() {
            self.has_header = other.has_header;
        }
        if other.skip_rows.is_some() {
            self.skip_rows = other.skip_rows;
        }
        if other.compression.is_some() {
            self.compression = other.compression;
        }
    }
}

impl RecentsConfig {
    pub fn merge(&mut self, other: Self) {
        let default = RecentsConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.limit != default.limit {
            self.limit = other.limit;
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
