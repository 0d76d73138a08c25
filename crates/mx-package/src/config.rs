use std::time::Duration;

use mx_auth::HttpTimeouts;
use url::Url;

use crate::errors::Result;

/// Base endpoint of the package metadata service; the content id is appended
pub const PACKAGE_SERVICE_BASE: &str = "https://packagespc.xboxlive.com/GetBasePackage/";

/// Installer metadata files that are not worth a direct download
pub const EXCLUDED_EXTENSIONS: &[&str] = &[".phf", ".xsp"];

/// Configuration for PackageClient
#[derive(Debug, Clone)]
pub struct PackageClientConfig {
    pub base_url: Url,
    pub http_timeouts: HttpTimeouts,
    pub user_agent: Option<String>,
    /// Compared case-insensitively against the end of each file name
    pub excluded_extensions: Vec<String>,
}

impl PackageClientConfig {
    pub fn xbox_live() -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(PACKAGE_SERVICE_BASE)?,
            http_timeouts: HttpTimeouts::default(),
            user_agent: Some(concat!("msixvc-dl/", env!("CARGO_PKG_VERSION")).to_string()),
            excluded_extensions: EXCLUDED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        })
    }

    /// The base URL must end in `/` so the content id is appended, not substituted
    pub fn with_base_url(mut self, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = base_url;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.http_timeouts = HttpTimeouts { connect, request };
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_excluded_extensions(mut self, extensions: Vec<String>) -> Self {
        self.excluded_extensions = extensions;
        self
    }
}
