use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::data::{DEFAULT_ZOOM, IPIFY_API_URL, OSM_TILE_URL, SEED_QUERY};
use crate::error::ConfigError;

pub const API_KEY_ENV: &str = "IPIFY_API_KEY";
pub const CONFIG_PATH_ENV: &str = "IP_TRACKER_CONFIG";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub tile_url: String,
    pub seed_query: String,
    pub zoom: f64,
    pub request_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: None,
            endpoint: IPIFY_API_URL.to_string(),
            tile_url: OSM_TILE_URL.to_string(),
            seed_query: SEED_QUERY.to_string(),
            zoom: DEFAULT_ZOOM,
            request_timeout: None,
        }
    }
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    api_key: Option<String>,
    endpoint: Option<String>,
    tile_url: Option<String>,
    seed_query: Option<String>,
    zoom: Option<f64>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Defaults, then the config file, then the environment.
    pub fn load() -> Result<Settings, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);
        let env_key = std::env::var(API_KEY_ENV).ok();
        Settings::from_sources(path.as_deref(), env_key)
    }

    pub fn from_sources(path: Option<&Path>, env_key: Option<String>) -> Result<Settings, ConfigError> {
        let mut settings = Settings::default();

        if let Some(path) = path {
            if let Some(file) = read_settings_file(path)? {
                settings.apply(file);
            }
        }

        if let Some(key) = non_blank(env_key) {
            settings.api_key = Some(key);
        }

        Ok(settings)
    }

    /// The configured key, or the error that stops the tracker from starting.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    fn apply(&mut self, file: SettingsFile) {
        if let Some(key) = non_blank(file.api_key) {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(tile_url) = file.tile_url {
            self.tile_url = tile_url;
        }
        if let Some(seed) = non_blank(file.seed_query) {
            self.seed_query = seed;
        }
        if let Some(zoom) = file.zoom {
            self.zoom = zoom;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ip-tracker").join("config.toml"))
}

fn read_settings_file(path: &Path) -> Result<Option<SettingsFile>, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No config file at {}", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let file = toml::from_str(&text).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded config from {}", path.display());
    Ok(Some(file))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
