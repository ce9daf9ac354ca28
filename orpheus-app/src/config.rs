use crate::startup::StartupError;
use orpheus_core::{DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_SENTINEL};
use orpheus_providers::{BackendConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MODEL};
use orpheus_tools::sources::remote::{DEFAULT_CATALOG_NAME, DEFAULT_CATALOG_URL};
use orpheus_tools::{CollisionPolicy, RemoteCatalogConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Backend credential.
pub const GOOGLE_ENV: &str = "GOOGLE";
/// Remote catalog bearer token.
pub const GITHUB_ENV: &str = "GITHUB";

/// Contents of the optional settings file. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub backend: BackendSettings,
    pub remote_catalog: RemoteCatalogSettings,
    pub tools: ToolSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendSettings {
    pub base_url: String,
    pub model: String,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteCatalogSettings {
    pub enabled: bool,
    pub name: String,
    pub base_url: String,
}

impl Default for RemoteCatalogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            name: DEFAULT_CATALOG_NAME.to_string(),
            base_url: DEFAULT_CATALOG_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSettings {
    /// Unset means commands may run for as long as they like.
    pub command_timeout_secs: Option<u64>,
    pub collision_policy: CollisionPolicy,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    pub sentinel: String,
    pub max_tool_rounds: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(StartupError::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Self::parse(&content)
            .map_err(|e| StartupError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.tools
            .command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Settings plus the credentials taken from the environment, resolved once.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub google_api_key: Option<String>,
    pub github_token: Option<String>,
}

impl AppConfig {
    pub fn from_env(settings: Settings) -> Result<Self, StartupError> {
        Self::resolve(settings, |name| std::env::var(name).ok())
    }

    /// Resolve credentials through `lookup`. The hosted backend cannot be
    /// used without a key; a custom endpoint may not need one. A missing
    /// catalog token only degrades the remote catalog.
    pub fn resolve(
        settings: Settings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StartupError> {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let google_api_key = non_blank(GOOGLE_ENV);
        let github_token = non_blank(GITHUB_ENV);

        if google_api_key.is_none() && settings.backend.base_url == DEFAULT_BASE_URL {
            return Err(StartupError::Config(format!(
                "{} is not set; it must hold the API key for {}",
                GOOGLE_ENV, DEFAULT_BASE_URL
            )));
        }

        Ok(Self {
            settings,
            google_api_key,
            github_token,
        })
    }

    pub fn backend_config(&self) -> BackendConfig {
        let backend = &self.settings.backend;
        BackendConfig {
            base_url: backend.base_url.clone(),
            api_key: self.google_api_key.clone(),
            model: backend.model.clone(),
            max_retries: backend.max_retries,
            request_timeout: Duration::from_secs(backend.request_timeout_secs),
            ..BackendConfig::default()
        }
    }

    /// `None` when the remote catalog is switched off.
    pub fn remote_catalog_config(&self) -> Option<RemoteCatalogConfig> {
        let remote = &self.settings.remote_catalog;
        if !remote.enabled {
            return None;
        }
        Some(
            RemoteCatalogConfig::new(remote.name.clone(), remote.base_url.clone())
                .with_bearer_token(self.github_token.clone()),
        )
    }
}
