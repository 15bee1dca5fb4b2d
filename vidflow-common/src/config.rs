//! Configuration loading and root folder resolution
//!
//! Two tiers:
//! 1. **TOML bootstrap**: bind address, port, database file, external
//!    service credentials. Read once at startup.
//! 2. **Database runtime**: the `settings` table, defaults ensured by
//!    [`crate::db::init_database`].
//!
//! Root folder priority: command line, then environment variable, then the
//! TOML `root_folder` key, then the OS default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "VIDFLOW_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "vidflow.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database path; defaults to `<root>/vidflow.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Session lifetime in hours
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    #[serde(default)]
    pub youtube: YoutubeConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_path: None,
            bind_address: default_bind_address(),
            port: default_port(),
            session_ttl_hours: default_session_ttl_hours(),
            youtube: YoutubeConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// YouTube Data API access
#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_youtube_base_url(),
        }
    }
}

/// OpenAI-compatible embedding and chat endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_analysis_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_analysis_base_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5730
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_analysis_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_chat_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load from an explicit path, or the platform config file, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match find_config_file() {
                Some(path) => path,
                None => {
                    info!("No config file found, using built-in defaults");
                    return Ok(Self::default());
                }
            },
        };

        info!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Database file: explicit path, else `<root_folder>/vidflow.db`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE))
    }
}

/// Root folder resolution
///
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML `root_folder`
/// 4. OS-dependent default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
        warn!("{} is set but empty, ignoring", env_var_name);
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Create the root folder if needed
pub fn ensure_root_folder(root_folder: &Path) -> Result<()> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder)?;
        info!("Created root folder: {}", root_folder.display());
    }
    Ok(())
}

/// Platform config file, user location first
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("vidflow").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/vidflow/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("vidflow"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/vidflow"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("vidflow"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/vidflow"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("vidflow"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\vidflow"))
    } else {
        PathBuf::from("./vidflow_data")
    }
}
