use mx_auth::XToken;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::PackageClientConfig;
use crate::content_id::ContentId;
use crate::errors::{PackageError, Result};
use crate::models::PackageQueryResult;

/// Client for the package metadata service
#[derive(Debug, Clone)]
pub struct PackageClient {
    config: PackageClientConfig,
    http: Client,
}

impl PackageClient {
    pub fn new(config: PackageClientConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("msixvc-dl"))
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &PackageClientConfig {
        &self.config
    }

    /// Validate `content_id` and fetch its package metadata
    ///
    /// A malformed id fails before any request is made.
    pub async fn fetch_package(
        &self,
        content_id: &str,
        service_token: &XToken,
    ) -> Result<PackageQueryResult> {
        let content_id: ContentId = content_id.parse()?;
        self.fetch(&content_id, service_token).await
    }

    #[instrument(skip(self, service_token), fields(content_id = %content_id))]
    pub async fn fetch(
        &self,
        content_id: &ContentId,
        service_token: &XToken,
    ) -> Result<PackageQueryResult> {
        let url = self.config.base_url.join(&content_id.to_string())?;

        debug!("Requesting package metadata");
        let response = self
            .http
            .get(url)
            .header("Authorization", service_token.authorization_header())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PackageError::RemoteError { status });
        }

        let body = response.bytes().await?;
        let result: PackageQueryResult = serde_json::from_slice(&body)?;
        debug!(
            found = result.package_found,
            files = result.package_files.len(),
            "Package metadata received"
        );

        Ok(result)
    }
}
