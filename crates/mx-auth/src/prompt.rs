use url::Url;

/// Source of the redirect URL produced by a browser sign-in
///
/// Called whenever no usable user token is left. Returning `None` (or an
/// empty string) declines the sign-in.
#[async_trait::async_trait]
pub trait SignInPrompt: Send + Sync {
    async fn redirect_url(&self, sign_in_url: &Url) -> Option<String>;
}

/// Prompt that always declines
///
/// Use this when only previously stored credentials may be used.
#[derive(Debug, Clone, Default)]
pub struct NoSignInPrompt;

#[async_trait::async_trait]
impl SignInPrompt for NoSignInPrompt {
    async fn redirect_url(&self, _sign_in_url: &Url) -> Option<String> {
        None
    }
}

/// Prompt answering with a fixed redirect URL, for tests and automation
#[derive(Debug, Clone)]
pub struct StaticSignInPrompt {
    redirect: String,
}

impl StaticSignInPrompt {
    pub fn new(redirect: impl Into<String>) -> Self {
        Self {
            redirect: redirect.into(),
        }
    }
}

#[async_trait::async_trait]
impl SignInPrompt for StaticSignInPrompt {
    async fn redirect_url(&self, _sign_in_url: &Url) -> Option<String> {
        Some(self.redirect.clone())
    }
}
