/*!
 * Configuration types for seqport
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SeqportError};

/// Default SODAR server when nothing else is configured
pub const DEFAULT_SODAR_URL: &str = "https://sodar.bihealth.org/";

/// Environment variable holding the SODAR URL
pub const ENV_SODAR_URL: &str = "SODAR_URL";

/// Environment variable holding the SODAR API token
pub const ENV_SODAR_API_TOKEN: &str = "SODAR_API_TOKEN";

/// Name of the rc file in the user's home directory
pub const RC_FILE_NAME: &str = ".seqportrc.toml";

/// Contents of the rc file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RcFile {
    #[serde(default)]
    pub global: GlobalSection,
}

/// The `[global]` section of the rc file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSection {
    /// SODAR server URL
    #[serde(default)]
    pub sodar_server_url: Option<String>,

    /// SODAR API token
    #[serde(default)]
    pub sodar_api_token: Option<String>,
}

impl RcFile {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: RcFile = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load an explicit rc file, or the default one if it exists.
    ///
    /// An explicitly named file must exist; a missing default file yields
    /// an empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(SeqportError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)
            }
            None => match default_rc_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}

/// Location of the default rc file
pub fn default_rc_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(RC_FILE_NAME))
}

/// Server URL and API token after resolution
#[derive(Clone, PartialEq)]
pub struct SodarSettings {
    pub server_url: String,
    pub api_token: String,
}

impl std::fmt::Debug for SodarSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SodarSettings")
            .field("server_url", &self.server_url)
            .field("api_token", &"***")
            .finish()
    }
}

impl SodarSettings {
    /// Resolve settings: command line, then rc file, then environment.
    pub fn resolve(
        cli_url: Option<String>,
        cli_token: Option<String>,
        rc: &RcFile,
    ) -> Result<Self> {
        Self::resolve_with_env(cli_url, cli_token, rc, |key| std::env::var(key).ok())
    }

    /// Same as [`SodarSettings::resolve`] with an injectable environment lookup
    pub fn resolve_with_env<F>(
        cli_url: Option<String>,
        cli_token: Option<String>,
        rc: &RcFile,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let server_url = non_empty(cli_url)
            .or_else(|| non_empty(rc.global.sodar_server_url.clone()))
            .or_else(|| non_empty(env(ENV_SODAR_URL)))
            .unwrap_or_else(|| DEFAULT_SODAR_URL.to_string());

        let api_token = non_empty(cli_token)
            .or_else(|| non_empty(rc.global.sodar_api_token.clone()))
            .or_else(|| non_empty(env(ENV_SODAR_API_TOKEN)))
            .ok_or_else(|| {
                SeqportError::Config(format!(
                    "SODAR API token missing: pass --sodar-api-token, set it in {} or export {}",
                    RC_FILE_NAME, ENV_SODAR_API_TOKEN
                ))
            })?;

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }
}

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Logging options shared by all subcommands
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}
