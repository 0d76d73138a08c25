use mx_auth::IdentityContext;
use tracing::{info, instrument};

use crate::client::PackageClient;
use crate::content_id::ContentId;
use crate::errors::Result;
use crate::filter::{select_download_links, DownloadLink};

/// Resolve the direct download links for one content id
///
/// The id is validated first, then the service token is refreshed if needed,
/// so neither the identity service nor the package service is contacted for
/// malformed input.
#[instrument(skip(identity, client))]
pub async fn resolve_download_links(
    identity: &IdentityContext,
    client: &PackageClient,
    content_id: &str,
) -> Result<Vec<DownloadLink>> {
    let content_id: ContentId = content_id.parse()?;
    let service_token = identity.ensure_service_token().await?;

    let result = client.fetch(&content_id, &service_token).await?;
    let links = select_download_links(&result, &client.config().excluded_extensions)?;
    info!(files = links.len(), "Resolved download links");

    Ok(links)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::test_support::{file, found_body, CONTENT_ID};
    use crate::config::PackageClientConfig;
    use crate::errors::PackageError;
    use mx_auth::{
        AuthConfig, AuthState, CredentialBundle, Endpoints, LiveTokens, MemoryCredentialStore,
        NoSignInPrompt, XToken, XblAuthClient,
    };
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn xtoken(token: &str, valid_for: chrono::Duration) -> XToken {
        let now = chrono::Utc::now();
        XToken {
            token: token.to_string(),
            uhs: "uhs-1234".to_string(),
            issued_at: now - chrono::Duration::hours(1),
            not_after: now + valid_for,
        }
    }

    fn identity_for(server: &MockServer) -> IdentityContext {
        let base = Url::parse(&server.uri()).unwrap();
        let config = AuthConfig::xbox_live()
            .unwrap()
            .with_endpoints(Endpoints::with_base(&base).unwrap());

        let mut bundle =
            CredentialBundle::new(LiveTokens::new("live".to_string(), None, 86400, None));
        bundle.user_token = Some(xtoken("user-jwt", chrono::Duration::hours(8)));
        bundle.xsts = Some(xtoken("xsts-jwt", chrono::Duration::hours(8)));

        IdentityContext::from_state(
            XblAuthClient::new(config).unwrap(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(NoSignInPrompt),
            AuthState::UserAuthenticated(bundle),
        )
    }

    fn package_client_for(server: &MockServer) -> PackageClient {
        let base = Url::parse(&format!("{}/GetBasePackage/", server.uri())).unwrap();
        PackageClient::new(PackageClientConfig::xbox_live().unwrap().with_base_url(base)).unwrap()
    }

    async fn mount_update_token(server: &MockServer, times: u64) {
        let now = chrono::Utc::now();
        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "IssueInstant": now.to_rfc3339(),
                "NotAfter": (now + chrono::Duration::hours(16)).to_rfc3339(),
                "Token": "update-jwt",
                "DisplayClaims": { "xui": [ { "uhs": "uhs-1234" } ] }
            })))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_invalid_id_contacts_nothing() {
        let server = MockServer::start().await;
        mount_update_token(&server, 0).await;
        Mock::given(path_regex("^/GetBasePackage/.*"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = resolve_download_links(
            &identity_for(&server),
            &package_client_for(&server),
            "definitely-not-a-guid",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PackageError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_resolves_links_with_fresh_token() {
        let server = MockServer::start().await;
        mount_update_token(&server, 1).await;
        Mock::given(method("GET"))
            .and(path(format!("/GetBasePackage/{}", CONTENT_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(found_body(vec![
                file("app.msixvc", &["http://cdn/"], "p/app.msixvc"),
                file("meta.phf", &["http://cdn/"], "p/meta.phf"),
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let identity = identity_for(&server);
        let client = package_client_for(&server);

        let links = resolve_download_links(&identity, &client, CONTENT_ID).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "http://cdn/p/app.msixvc");

        // Second lookup reuses the cached service token
        resolve_download_links(&identity, &client, CONTENT_ID).await.unwrap();
    }

    #[tokio::test]
    async fn test_not_found_package() {
        let server = MockServer::start().await;
        mount_update_token(&server, 1).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "PackageFound": false })))
            .mount(&server)
            .await;

        let err = resolve_download_links(
            &identity_for(&server),
            &package_client_for(&server),
            CONTENT_ID,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PackageError::PackageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_identity_failure_is_authentication_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = resolve_download_links(
            &identity_for(&server),
            &package_client_for(&server),
            CONTENT_ID,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PackageError::AuthenticationFailed(_)));
    }
}
