//! Application configuration for the TecDoc exporter.
//!
//! User config lives at `~/.tecdoc-export/tecdoc-export.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TecdocError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "tecdoc-export.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tecdoc-export";

// ---------------------------------------------------------------------------
// Config structs (matching tecdoc-export.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog API connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Output settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Which sibling endpoints are called per article.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// JSON endpoint every request is POSTed to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Provider (customer) id sent with every request.
    #[serde(default)]
    pub provider: u32,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Article country filter.
    #[serde(default = "default_locale")]
    pub country: String,

    /// Response language.
    #[serde(default = "default_locale")]
    pub lang: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            provider: 0,
            api_key_env: default_api_key_env(),
            country: default_locale(),
            lang: default_locale(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://webservice.tecalliance.services/pegasus-3-0/services/TecdocToCatDLB.jsonEndpoint"
        .into()
}
fn default_api_key_env() -> String {
    "TECDOC_API_KEY".into()
}
fn default_locale() -> String {
    "de".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl ApiConfig {
    /// Read the API key from the configured env var.
    pub fn api_key(&self) -> Result<String> {
        let var_name = &self.api_key_env;
        match std::env::var(var_name) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Err(TecdocError::config(format!(
                "API key not found. Set the {var_name} environment variable."
            ))),
        }
    }

    /// Check everything a live run needs: a parseable endpoint, a provider id, and a key.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url).map_err(|e| {
            TecdocError::config(format!("invalid api.base_url '{}': {e}", self.base_url))
        })?;
        if self.provider == 0 {
            return Err(TecdocError::config(
                "api.provider is not set. Add your provider id to the [api] section.",
            ));
        }
        self.api_key().map(|_| ())
    }
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory CSV files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Field delimiter for the normalized tables.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Write `manifest.json` next to the CSV files.
    #[serde(default = "default_true")]
    pub write_manifest: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            delimiter: default_delimiter(),
            write_manifest: true,
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}
fn default_delimiter() -> char {
    ';'
}
fn default_true() -> bool {
    true
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Linking target type for vehicle linkages (`C` = passenger cars).
    #[serde(default = "default_linking_target_type")]
    pub linking_target_type: String,

    #[serde(default = "default_true")]
    pub attributes: bool,

    #[serde(default = "default_true")]
    pub references: bool,

    #[serde(default = "default_true")]
    pub components: bool,

    #[serde(default = "default_true")]
    pub relations: bool,

    #[serde(default = "default_true")]
    pub vehicles: bool,

    #[serde(default = "default_true")]
    pub brands: bool,

    /// Ask the classification endpoint when an article has no category.
    #[serde(default = "default_true")]
    pub classification: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            linking_target_type: default_linking_target_type(),
            attributes: true,
            references: true,
            components: true,
            relations: true,
            vehicles: true,
            brands: true,
            classification: true,
        }
    }
}

impl FetchConfig {
    /// Only the article search itself; no sibling endpoints.
    pub fn articles_only() -> Self {
        Self {
            attributes: false,
            references: false,
            components: false,
            relations: false,
            vehicles: false,
            brands: false,
            classification: false,
            ..Self::default()
        }
    }
}

fn default_linking_target_type() -> String {
    "C".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.tecdoc-export/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| TecdocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tecdoc-export/tecdoc-export.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TecdocError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TecdocError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TecdocError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TecdocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TecdocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
