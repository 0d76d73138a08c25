use std::time::Duration;
use url::Url;

use crate::errors::Result;

/// Identity service endpoints
pub mod endpoints {
    pub const LIVE_AUTHORIZE: &str = "https://login.live.com/oauth20_authorize.srf";
    pub const LIVE_TOKEN: &str = "https://login.live.com/oauth20_token.srf";
    pub const USER_AUTHENTICATE: &str = "https://user.auth.xboxlive.com/user/authenticate";
    pub const XSTS_AUTHORIZE: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
}

/// Windows Live desktop client used by the Xbox app sign-in flow
pub mod live {
    pub const CLIENT_ID: &str = "00000000402b5328";
    pub const REDIRECT_URI: &str = "https://login.live.com/oauth20_desktop.srf";
    pub const SCOPE: &str = "service::user.auth.xboxlive.com::MBI_SSL";

    /// Additional query parameters for the implicit token flow
    pub const EXTRA_PARAMS: &[(&str, &str)] = &[("display", "touch"), ("locale", "en")];

    /// Refresh token value the live flow accepts when the redirect carries none
    pub const PLACEHOLDER_REFRESH_TOKEN: &str = "thisisunused";
}

/// Relying parties
pub const RP_XBOXLIVE: &str = "http://xboxlive.com";
pub const RP_UPDATE: &str = "http://update.xboxlive.com";
pub const RP_AUTH_XBOXLIVE: &str = "http://auth.xboxlive.com";

/// Sandbox used for every XSTS request
pub const SANDBOX_RETAIL: &str = "RETAIL";

/// Time skew for token expiration (refresh 5 minutes early)
pub const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(300);

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Endpoint set used by [`crate::XblAuthClient`]
///
/// Defaults to the production identity hosts; tests point these at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub live_authorize: Url,
    pub live_token: Url,
    pub user_authenticate: Url,
    pub xsts_authorize: Url,
}

impl Endpoints {
    pub fn production() -> Result<Self> {
        Ok(Self {
            live_authorize: Url::parse(endpoints::LIVE_AUTHORIZE)?,
            live_token: Url::parse(endpoints::LIVE_TOKEN)?,
            user_authenticate: Url::parse(endpoints::USER_AUTHENTICATE)?,
            xsts_authorize: Url::parse(endpoints::XSTS_AUTHORIZE)?,
        })
    }

    /// Route every network endpoint to a single base URL, keeping the paths
    pub fn with_base(base: &Url) -> Result<Self> {
        Ok(Self {
            live_authorize: base.join("/oauth20_authorize.srf")?,
            live_token: base.join("/oauth20_token.srf")?,
            user_authenticate: base.join("/user/authenticate")?,
            xsts_authorize: base.join("/xsts/authorize")?,
        })
    }
}

/// Configuration for XblAuthClient
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Windows Live client ID
    pub client_id: String,

    /// Redirect URI the sign-in page lands on
    pub redirect_uri: Url,

    pub endpoints: Endpoints,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Custom user agent (optional)
    pub user_agent: Option<String>,
}

impl AuthConfig {
    /// Config for the Xbox app live client against the production hosts
    pub fn xbox_live() -> Result<Self> {
        Ok(Self {
            client_id: live::CLIENT_ID.to_string(),
            redirect_uri: Url::parse(live::REDIRECT_URI)?,
            endpoints: Endpoints::production()?,
            http_timeouts: HttpTimeouts::default(),
            user_agent: Some(concat!("msixvc-dl/", env!("CARGO_PKG_VERSION")).to_string()),
        })
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.http_timeouts = timeouts;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }
}
