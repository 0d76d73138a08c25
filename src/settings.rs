use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use mx_auth::{AuthConfig, HttpTimeouts};
use mx_package::PackageClientConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Settings file looked up next to the executable
pub const SETTINGS_FILENAME: &str = "msixvc-dl.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub client_id: Option<String>,
    pub package_service_url: Option<String>,
    pub user_agent: Option<String>,
    pub excluded_extensions: Option<Vec<String>>,
    pub http: HttpSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let timeouts = HttpTimeouts::default();
        Self {
            connect_timeout_secs: timeouts.connect.as_secs(),
            request_timeout_secs: timeouts.request.as_secs(),
        }
    }
}

impl Settings {
    /// Load from `explicit`, else from the executable directory, else defaults
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => executable_dir()
                .map(|dir| dir.join(SETTINGS_FILENAME))
                .filter(|path| path.is_file()),
        };

        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        debug!("Loading settings from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    fn timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect: Duration::from_secs(self.http.connect_timeout_secs),
            request: Duration::from_secs(self.http.request_timeout_secs),
        }
    }

    pub fn auth_config(&self) -> anyhow::Result<AuthConfig> {
        let mut config = AuthConfig::xbox_live()?.with_timeouts(self.timeouts());
        if let Some(client_id) = &self.client_id {
            config = config.with_client_id(client_id.clone());
        }
        if self.user_agent.is_some() {
            config = config.with_user_agent(self.user_agent.clone());
        }
        Ok(config)
    }

    pub fn package_config(&self) -> anyhow::Result<PackageClientConfig> {
        let timeouts = self.timeouts();
        let mut config =
            PackageClientConfig::xbox_live()?.with_timeouts(timeouts.connect, timeouts.request);

        if let Some(url) = &self.package_service_url {
            let url = Url::parse(url).with_context(|| format!("Invalid package_service_url {url}"))?;
            config = config.with_base_url(url);
        }
        if self.user_agent.is_some() {
            config = config.with_user_agent(self.user_agent.clone());
        }
        if let Some(extensions) = &self.excluded_extensions {
            config = config.with_excluded_extensions(extensions.clone());
        }
        Ok(config)
    }
}

pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
