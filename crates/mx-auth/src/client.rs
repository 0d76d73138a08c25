use std::borrow::Cow;
use std::collections::HashMap;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{live, AuthConfig, RP_AUTH_XBOXLIVE, RP_XBOXLIVE, SANDBOX_RETAIL};
use crate::errors::{AuthError, Result, XstsError};
use crate::models::*;
use crate::tokens::{CredentialBundle, LiveTokens, SignInResponse, XToken};

/// Lifetime assumed for a live access token whose redirect omits `expires_in`
const DEFAULT_LIVE_EXPIRES_IN: u64 = 86400;

/// Main client for the Xbox Live identity exchange
#[derive(Debug, Clone)]
pub struct XblAuthClient {
    config: AuthConfig,
    http: Client,
}

impl XblAuthClient {
    /// Create a new authentication client
    pub fn new(config: AuthConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("msixvc-dl"))
            .build()?;

        Ok(Self { config, http })
    }

    /// Build the sign-in URL for the user to open in a browser
    pub fn build_sign_in_url(&self) -> Url {
        let mut url = self.config.endpoints.live_authorize.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("response_type", "token")
            .append_pair("scope", live::SCOPE);

        for (key, value) in live::EXTRA_PARAMS {
            url.query_pairs_mut().append_pair(key, value);
        }

        url
    }

    /// Refresh the live access token using a refresh token
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_live_token(&self, refresh_token: &str) -> Result<LiveTokens> {
        let mut url = self.config.endpoints.live_token.clone();
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", live::SCOPE)
            .append_pair("refresh_token", refresh_token);

        debug!("Refreshing live access token");
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if body.contains("invalid_grant") {
                return Err(AuthError::OAuthInvalidGrant);
            }

            return Err(AuthError::Http {
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }

        let token_response: LiveTokenResponse = response.json().await?;
        Ok(LiveTokens::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
            token_response.user_id,
        ))
    }

    /// Exchange a live access token for an Xbox Live user token
    #[instrument(skip(self, access_token))]
    pub async fn authenticate_user(&self, access_token: &str) -> Result<XToken> {
        debug!("Authenticating with Xbox Live");
        let response = self.post_user_authenticate(&format!("t={}", access_token)).await?;

        // Handle the "d=" retry caveat
        if response.status() == StatusCode::BAD_REQUEST {
            warn!("User authentication failed, retrying with 'd=' prefix");

            let retry_response = self
                .post_user_authenticate(&format!("d={}", access_token))
                .await?;

            if !retry_response.status().is_success() {
                return Err(AuthError::UserBadRequest);
            }

            let xas: XasResponse = retry_response.json().await?;
            return xas.try_into();
        }

        let xas: XasResponse = check_status(response).await?.json().await?;
        xas.try_into()
    }

    async fn post_user_authenticate(&self, rps_ticket: &str) -> Result<Response> {
        let request = UserAuthRequest {
            properties: UserAuthProperties {
                auth_method: "RPS".to_string(),
                site_name: "user.auth.xboxlive.com".to_string(),
                rps_ticket: rps_ticket.to_string(),
            },
            relying_party: RP_AUTH_XBOXLIVE.to_string(),
            token_type: "JWT".to_string(),
        };

        Ok(self
            .http
            .post(self.config.endpoints.user_authenticate.clone())
            .header("Accept", "application/json")
            .header("x-xbl-contract-version", "1")
            .json(&request)
            .send()
            .await?)
    }

    /// Authorize with XSTS for the given relying party
    #[instrument(skip(self, user_token, device_token, title_token))]
    pub async fn authorize_xsts(
        &self,
        user_token: &XToken,
        device_token: Option<&XToken>,
        title_token: Option<&XToken>,
        relying_party: &str,
    ) -> Result<XToken> {
        let request = XstsAuthRequest {
            properties: XstsAuthProperties {
                sandbox_id: SANDBOX_RETAIL.to_string(),
                user_tokens: vec![user_token.token.clone()],
                device_token: device_token.map(|t| t.token.clone()),
                title_token: title_token.map(|t| t.token.clone()),
            },
            relying_party: relying_party.to_string(),
            token_type: "JWT".to_string(),
        };

        debug!("Authorizing with XSTS");
        let response = self
            .http
            .post(self.config.endpoints.xsts_authorize.clone())
            .header("Accept", "application/json")
            .header("x-xbl-contract-version", "1")
            .json(&request)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let error_response: XstsErrorResponse = response.json().await?;
            return Err(XstsError::from_xerr(error_response.xerr).into());
        }

        let xas: XasResponse = check_status(response).await?.json().await?;
        xas.try_into()
    }

    /// Complete the exchange from a sign-in redirect to a credential bundle
    #[instrument(skip(self, response))]
    pub async fn complete_sign_in(&self, response: SignInResponse) -> Result<CredentialBundle> {
        debug!("Starting sign-in exchange");

        let live: LiveTokens = response.into();
        let mut bundle = CredentialBundle::new(live);
        self.derive_user_tokens(&mut bundle).await?;

        Ok(bundle)
    }

    /// Re-derive the user and generic XSTS tokens without a browser sign-in
    ///
    /// Needs a real refresh token when the live access token has expired.
    #[instrument(skip(self, bundle))]
    pub async fn refresh_bundle(&self, bundle: &CredentialBundle) -> Result<CredentialBundle> {
        let mut refreshed = bundle.clone();

        if refreshed.live.is_expired() {
            let refresh_token = bundle
                .live
                .usable_refresh_token()
                .ok_or(AuthError::MissingRefreshToken)?;

            let mut live = self.refresh_live_token(refresh_token).await?;
            if live.refresh_token.is_none() {
                live.refresh_token = bundle.live.refresh_token.clone();
            }
            if live.user_id.is_none() {
                live.user_id = bundle.live.user_id.clone();
            }
            refreshed.live = live;
        }

        self.derive_user_tokens(&mut refreshed).await?;
        Ok(refreshed)
    }

    async fn derive_user_tokens(&self, bundle: &mut CredentialBundle) -> Result<()> {
        let user_token = self.authenticate_user(&bundle.live.access_token).await?;
        let xsts = self
            .authorize_xsts(
                &user_token,
                bundle.valid_device_token(),
                bundle.valid_title_token(),
                RP_XBOXLIVE,
            )
            .await?;

        bundle.user_token = Some(user_token);
        bundle.xsts = Some(xsts);
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Http {
        status,
        body_snippet: body.chars().take(200).collect(),
    })
}

fn redirect_params(url: &Url) -> HashMap<String, String> {
    match url.fragment().filter(|f| !f.is_empty()) {
        Some(fragment) => url::form_urlencoded::parse(fragment.as_bytes())
            .into_owned()
            .collect(),
        None => url.query_pairs().into_owned().collect(),
    }
}

fn has_param(pairs: &str, key: &str) -> bool {
    url::form_urlencoded::parse(pairs.as_bytes()).any(|(k, _)| k == key)
}

/// Append the placeholder `refresh_token` when the redirect carries none
///
/// The parameter counts as present in either the query or the fragment;
/// URLs that already hold it are returned unchanged.
pub fn with_refresh_token_placeholder(raw: &str) -> Cow<'_, str> {
    let has_refresh_token = Url::parse(raw)
        .map(|url| {
            url.query().is_some_and(|q| has_param(q, "refresh_token"))
                || url.fragment().is_some_and(|f| has_param(f, "refresh_token"))
        })
        .unwrap_or_else(|_| raw.contains("refresh_token="));

    if has_refresh_token {
        return Cow::Borrowed(raw);
    }

    let separator = if raw.ends_with(['#', '?', '&']) {
        ""
    } else if raw.contains(['#', '?']) {
        "&"
    } else {
        "#"
    };

    Cow::Owned(format!(
        "{raw}{separator}refresh_token={}",
        live::PLACEHOLDER_REFRESH_TOKEN
    ))
}

/// Parse the URL the browser lands on after sign-in
#[instrument(skip(raw_url))]
pub fn parse_sign_in_redirect(raw_url: &str) -> Result<SignInResponse> {
    let raw_url = raw_url.trim();
    let patched = with_refresh_token_placeholder(raw_url);
    let url = Url::parse(&patched)?;
    let mut params = redirect_params(&url);

    if let Some(error) = params.get("error") {
        if error == "access_denied" {
            return Err(AuthError::UserCancelled);
        }
        warn!("Sign-in redirect reported error: {}", error);
        return Err(AuthError::InvalidRedirect);
    }

    let access_token = params
        .remove("access_token")
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidRedirect)?;

    let expires_in = match params.remove("expires_in") {
        Some(value) => value
            .parse()
            .map_err(|_| AuthError::InvalidResponse(format!("Invalid expires_in: {}", value)))?,
        None => DEFAULT_LIVE_EXPIRES_IN,
    };

    Ok(SignInResponse {
        access_token,
        token_type: params.remove("token_type").unwrap_or_else(|| "bearer".to_string()),
        expires_in,
        scope: params.remove("scope"),
        refresh_token: params.remove("refresh_token"),
        user_id: params.remove("user_id"),
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::xas_body;
    use super::*;
    use crate::config::{Endpoints, RP_UPDATE};
    use crate::tokens::test_support::{bundle, xtoken};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REDIRECT: &str = "https://login.live.com/oauth20_desktop.srf?lc=1033#access_token=EwA%2Btoken&token_type=bearer&expires_in=86400&scope=service::user.auth.xboxlive.com::MBI_SSL&user_id=abc123";

    fn client_for(server: &MockServer) -> XblAuthClient {
        let base = Url::parse(&server.uri()).unwrap();
        let config = AuthConfig::xbox_live()
            .unwrap()
            .with_endpoints(Endpoints::with_base(&base).unwrap());
        XblAuthClient::new(config).unwrap()
    }

    #[test]
    fn test_sign_in_url_is_deterministic() {
        let client = XblAuthClient::new(AuthConfig::xbox_live().unwrap()).unwrap();
        let url = client.build_sign_in_url();

        assert_eq!(url, client.build_sign_in_url());
        assert_eq!(url.host_str(), Some("login.live.com"));

        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], live::CLIENT_ID);
        assert_eq!(params["response_type"], "token");
        assert_eq!(params["redirect_uri"], live::REDIRECT_URI);
        assert_eq!(params["scope"], live::SCOPE);
    }

    #[test]
    fn test_placeholder_appended_once() {
        let patched = with_refresh_token_placeholder(REDIRECT);
        assert!(matches!(patched, Cow::Owned(_)));
        assert_eq!(patched.matches("refresh_token=").count(), 1);
        assert!(patched.ends_with("&refresh_token=thisisunused"));

        let again = with_refresh_token_placeholder(&patched);
        assert!(matches!(again, Cow::Borrowed(_)));
        assert_eq!(again, patched);
    }

    #[test]
    fn test_existing_refresh_token_passes_through() {
        let raw = format!("{}&refresh_token=M.R3_real", REDIRECT);
        let patched = with_refresh_token_placeholder(&raw);
        assert!(matches!(patched, Cow::Borrowed(_)));
        assert_eq!(patched, raw);
    }

    #[test]
    fn test_refresh_token_in_query_with_fragment_passes_through() {
        let raw = "https://login.live.com/oauth20_desktop.srf?refresh_token=M.R3_real#access_token=abc&expires_in=86400";
        let patched = with_refresh_token_placeholder(raw);
        assert!(matches!(patched, Cow::Borrowed(_)));
        assert_eq!(patched, raw);
    }

    #[test]
    fn test_huge_expires_in_does_not_panic() {
        let raw = "https://login.live.com/oauth20_desktop.srf#access_token=abc&expires_in=99999999999999";
        let live: LiveTokens = parse_sign_in_redirect(raw).unwrap().into();
        assert!(!live.is_expired());
    }

    #[test]
    fn test_parse_redirect_fragment() {
        let response = parse_sign_in_redirect(REDIRECT).unwrap();
        assert_eq!(response.access_token, "EwA+token");
        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.expires_in, 86400);
        assert_eq!(response.user_id.as_deref(), Some("abc123"));
        assert_eq!(
            response.refresh_token.as_deref(),
            Some(live::PLACEHOLDER_REFRESH_TOKEN)
        );
    }

    #[test]
    fn test_parse_redirect_errors() {
        let denied = "https://login.live.com/oauth20_desktop.srf?error=access_denied&error_description=x";
        assert!(matches!(
            parse_sign_in_redirect(denied),
            Err(AuthError::UserCancelled)
        ));

        let missing = "https://login.live.com/oauth20_desktop.srf#token_type=bearer";
        assert!(matches!(
            parse_sign_in_redirect(missing),
            Err(AuthError::InvalidRedirect)
        ));

        assert!(matches!(
            parse_sign_in_redirect("not a url"),
            Err(AuthError::UrlParse(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_sign_in() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .and(body_partial_json(serde_json::json!({
                "Properties": { "RpsTicket": "t=EwA+token" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(xas_body("user-jwt", "uhs1")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .and(header("x-xbl-contract-version", "1"))
            .and(body_partial_json(serde_json::json!({
                "RelyingParty": RP_XBOXLIVE,
                "Properties": { "UserTokens": ["user-jwt"], "SandboxId": "RETAIL" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(xas_body("xsts-jwt", "uhs1")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let bundle = client
            .complete_sign_in(parse_sign_in_redirect(REDIRECT).unwrap())
            .await
            .unwrap();

        assert_eq!(bundle.user_token.as_ref().unwrap().token, "user-jwt");
        assert_eq!(bundle.xsts.as_ref().unwrap().uhs, "uhs1");
        assert!(bundle.is_usable());
    }

    #[tokio::test]
    async fn test_user_authenticate_retries_with_d_prefix() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .and(body_partial_json(serde_json::json!({ "Properties": { "RpsTicket": "t=abc" } })))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .and(body_partial_json(serde_json::json!({ "Properties": { "RpsTicket": "d=abc" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(xas_body("user-jwt", "uhs")))
            .expect(1)
            .mount(&server)
            .await;

        let token = client_for(&server).authenticate_user("abc").await.unwrap();
        assert_eq!(token.token, "user-jwt");
    }

    #[tokio::test]
    async fn test_xsts_denied_maps_xerr() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "Identity": "0",
                "XErr": 2148916233u64,
                "Message": ""
            })))
            .mount(&server)
            .await;

        let user = xtoken("user", chrono::Duration::hours(1));
        let err = client_for(&server)
            .authorize_xsts(&user, None, None, RP_UPDATE)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::XstsDenied(XstsError::NoXboxAccount)));
    }

    #[tokio::test]
    async fn test_xsts_sends_device_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .and(body_partial_json(serde_json::json!({
                "RelyingParty": RP_UPDATE,
                "Properties": { "DeviceToken": "device-jwt" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(xas_body("update-jwt", "uhs")))
            .expect(1)
            .mount(&server)
            .await;

        let user = xtoken("user", chrono::Duration::hours(1));
        let device = xtoken("device-jwt", chrono::Duration::hours(1));
        let token = client_for(&server)
            .authorize_xsts(&user, Some(&device), None, RP_UPDATE)
            .await
            .unwrap();

        assert_eq!(token.token, "update-jwt");
    }

    #[tokio::test]
    async fn test_refresh_bundle_requires_real_refresh_token() {
        let server = MockServer::start().await;
        let mut stale = bundle(-chrono::Duration::hours(1), -chrono::Duration::hours(1));
        stale.live.expires_at = chrono::Utc::now() - chrono::Duration::hours(1);

        let err = client_for(&server).refresh_bundle(&stale).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_bundle_uses_refresh_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oauth20_token.srf"))
            .and(query_param("grant_type", "refresh_token"))
            .and(query_param("refresh_token", "M.R3_real"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-access",
                "token_type": "bearer",
                "expires_in": 86400,
                "scope": live::SCOPE
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/user/authenticate"))
            .and(body_partial_json(serde_json::json!({ "Properties": { "RpsTicket": "t=fresh-access" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(xas_body("user-jwt", "uhs")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xsts/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(xas_body("xsts-jwt", "uhs")))
            .expect(1)
            .mount(&server)
            .await;

        let mut stale = bundle(-chrono::Duration::hours(1), -chrono::Duration::hours(1));
        stale.live.expires_at = chrono::Utc::now() - chrono::Duration::hours(1);
        stale.live.refresh_token = Some("M.R3_real".to_string());

        let refreshed = client_for(&server).refresh_bundle(&stale).await.unwrap();
        assert_eq!(refreshed.live.access_token, "fresh-access");
        assert_eq!(refreshed.live.refresh_token.as_deref(), Some("M.R3_real"));
        assert!(refreshed.is_usable());
    }
}
