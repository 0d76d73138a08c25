use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TOKEN_EXPIRY_SKEW;
use crate::models::XasResponse;

/// Upper bound on a live token lifetime; larger `expires_in` values are clamped
const MAX_LIVE_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

fn expiry_skew() -> chrono::Duration {
    chrono::Duration::from_std(TOKEN_EXPIRY_SKEW).unwrap_or(chrono::Duration::seconds(300))
}

/// Everything persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialBundle {
    pub live: LiveTokens,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<XToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_token: Option<XToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_token: Option<XToken>,
    /// XSTS token for the generic Xbox Live audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xsts: Option<XToken>,
}

impl CredentialBundle {
    pub fn new(live: LiveTokens) -> Self {
        Self {
            live,
            user_token: None,
            device_token: None,
            title_token: None,
            xsts: None,
        }
    }

    /// The generic XSTS token decides whether a stored bundle can be reused at startup
    pub fn is_usable(&self) -> bool {
        self.xsts.as_ref().is_some_and(XToken::is_valid)
    }

    /// A user token that can still be exchanged for service tokens
    pub fn valid_user_token(&self) -> Option<&XToken> {
        self.user_token.as_ref().filter(|t| t.is_valid())
    }

    /// Device token, if one is held and still valid
    pub fn valid_device_token(&self) -> Option<&XToken> {
        self.device_token.as_ref().filter(|t| t.is_valid())
    }

    /// Title token, if one is held and still valid
    pub fn valid_title_token(&self) -> Option<&XToken> {
        self.title_token.as_ref().filter(|t| t.is_valid())
    }
}

/// Windows Live tokens obtained from the browser sign-in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl LiveTokens {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: u64,
        user_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let lifetime = i64::try_from(expires_in.min(MAX_LIVE_LIFETIME_SECS))
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::zero());
        let expires_at = now.checked_add_signed(lifetime).unwrap_or(now);
        Self {
            access_token,
            refresh_token,
            expires_at,
            user_id,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() + expiry_skew() >= self.expires_at
    }

    /// The refresh token, unless it is missing or only the sign-in placeholder
    pub fn usable_refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .filter(|t| !t.is_empty() && *t != crate::config::live::PLACEHOLDER_REFRESH_TOKEN)
    }
}

/// Token issued by user.authenticate or xsts/authorize
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct XToken {
    pub token: String,
    /// User hash from the first xui display claim
    pub uhs: String,
    pub issued_at: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl XToken {
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + expiry_skew() < self.not_after
    }

    /// `Authorization` header value for Xbox Live services
    pub fn authorization_header(&self) -> String {
        format!("XBL3.0 x={};{}", self.uhs, self.token)
    }
}

impl std::fmt::Debug for XToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XToken")
            .field("token", &"[REDACTED]")
            .field("uhs", &self.uhs)
            .field("issued_at", &self.issued_at)
            .field("not_after", &self.not_after)
            .finish()
    }
}

impl TryFrom<XasResponse> for XToken {
    type Error = crate::errors::AuthError;

    fn try_from(response: XasResponse) -> Result<Self, Self::Error> {
        let claims = response.display_claims.xui.into_iter().next().ok_or_else(|| {
            crate::errors::AuthError::InvalidResponse("Missing XUI claims".to_string())
        })?;

        Ok(Self {
            token: response.token,
            uhs: claims.uhs,
            issued_at: response.issue_instant,
            not_after: response.not_after,
        })
    }
}

/// Token material pasted back from the sign-in redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub scope: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
}

impl From<SignInResponse> for LiveTokens {
    fn from(response: SignInResponse) -> Self {
        LiveTokens::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            response.user_id,
        )
    }
}
