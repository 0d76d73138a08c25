use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::client::{parse_sign_in_redirect, XblAuthClient};
use crate::config::RP_UPDATE;
use crate::errors::{AuthError, Result};
use crate::prompt::SignInPrompt;
use crate::store::CredentialStore;
use crate::tokens::{CredentialBundle, XToken};

/// Authentication progress of an [`IdentityContext`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing loaded or signed in yet
    NoCredentials,
    /// User tokens held, no service-scoped token minted
    UserAuthenticated(CredentialBundle),
    /// Package-service token minted
    ServiceAuthenticated {
        bundle: CredentialBundle,
        service_token: XToken,
    },
}

impl AuthState {
    pub fn bundle(&self) -> Option<&CredentialBundle> {
        match self {
            AuthState::NoCredentials => None,
            AuthState::UserAuthenticated(bundle) => Some(bundle),
            AuthState::ServiceAuthenticated { bundle, .. } => Some(bundle),
        }
    }
}

/// Owns the credential bundle and the in-memory service-scoped token
///
/// The state lock is held across a refresh, so concurrent callers wait for
/// the one exchange in flight instead of starting their own.
pub struct IdentityContext {
    client: XblAuthClient,
    store: Arc<dyn CredentialStore>,
    prompt: Arc<dyn SignInPrompt>,
    state: Mutex<AuthState>,
}

impl IdentityContext {
    pub fn new(
        client: XblAuthClient,
        store: Arc<dyn CredentialStore>,
        prompt: Arc<dyn SignInPrompt>,
    ) -> Self {
        Self::from_state(client, store, prompt, AuthState::NoCredentials)
    }

    pub fn from_state(
        client: XblAuthClient,
        store: Arc<dyn CredentialStore>,
        prompt: Arc<dyn SignInPrompt>,
        state: AuthState,
    ) -> Self {
        Self {
            client,
            store,
            prompt,
            state: Mutex::new(state),
        }
    }

    pub async fn state(&self) -> AuthState {
        self.state.lock().await.clone()
    }

    /// Load the stored bundle or sign in, then mint the service-scoped token
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<XToken> {
        let mut state = self.state.lock().await;

        let bundle = match self.store.load().await {
            Some(bundle) if bundle.is_usable() => {
                debug!("Reusing stored credentials");
                bundle
            }
            Some(_) => {
                warn!("Stored credentials expired, sign-in required");
                self.sign_in().await?
            }
            None => {
                info!("No stored credentials, sign-in required");
                self.sign_in().await?
            }
        };

        self.persist(&bundle).await;
        *state = AuthState::UserAuthenticated(bundle);

        self.mint_service_token(&mut state).await
    }

    /// Return a valid service-scoped token, re-deriving it when needed
    ///
    /// Only an invalid user token leads back to the sign-in prompt; an expired
    /// service token costs a single XSTS exchange.
    #[instrument(skip(self))]
    pub async fn ensure_service_token(&self) -> Result<XToken> {
        let mut state = self.state.lock().await;

        if let AuthState::ServiceAuthenticated { service_token, .. } = &*state
            && service_token.is_valid()
        {
            return Ok(service_token.clone());
        }

        self.mint_service_token(&mut state).await
    }

    async fn mint_service_token(&self, state: &mut AuthState) -> Result<XToken> {
        let mut bundle = match state.bundle() {
            Some(bundle) => bundle.clone(),
            None => match self.store.load().await {
                Some(bundle) => bundle,
                None => self.sign_in_and_persist().await?,
            },
        };

        if bundle.valid_user_token().is_none() {
            bundle = self.reauthenticate(&bundle).await?;
            *state = AuthState::UserAuthenticated(bundle.clone());
        }

        let user_token = bundle
            .valid_user_token()
            .ok_or_else(|| AuthError::InvalidResponse("User token missing after exchange".to_string()))?;

        debug!(audience = RP_UPDATE, "Deriving service token");
        let service_token = self
            .client
            .authorize_xsts(
                user_token,
                bundle.valid_device_token(),
                bundle.valid_title_token(),
                RP_UPDATE,
            )
            .await?;

        *state = AuthState::ServiceAuthenticated {
            bundle,
            service_token: service_token.clone(),
        };

        Ok(service_token)
    }

    async fn reauthenticate(&self, bundle: &CredentialBundle) -> Result<CredentialBundle> {
        let refreshed = match self.client.refresh_bundle(bundle).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!("Could not refresh user token ({}), sign-in required", e);
                self.sign_in().await?
            }
        };

        self.persist(&refreshed).await;
        Ok(refreshed)
    }

    async fn sign_in_and_persist(&self) -> Result<CredentialBundle> {
        let bundle = self.sign_in().await?;
        self.persist(&bundle).await;
        Ok(bundle)
    }

    async fn sign_in(&self) -> Result<CredentialBundle> {
        let url = self.client.build_sign_in_url();

        let redirect = self
            .prompt
            .redirect_url(&url)
            .await
            .filter(|r| !r.trim().is_empty())
            .ok_or(AuthError::AuthenticationRequired)?;

        let response = parse_sign_in_redirect(&redirect)?;
        let bundle = self.client.complete_sign_in(response).await?;
        info!("Sign-in completed");

        Ok(bundle)
    }

    async fn persist(&self, bundle: &CredentialBundle) {
        if let Err(e) = self.store.save(bundle).await {
            warn!("Failed to save credentials: {}", e);
        }
    }
}
