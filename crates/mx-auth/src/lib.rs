//! Xbox Live identity exchange for the package link tool
//!
//! This crate signs a user in through the Windows Live implicit flow and
//! turns the resulting access token into Xbox Live tokens usable against the
//! package service.
//!
//! # Authentication Flow
//!
//! 1. The user opens the sign-in URL and pastes back the redirect URL
//! 2. Xbox Live user authentication (`user.auth.xboxlive.com`)
//! 3. XSTS authorization for `http://xboxlive.com`, kept in the stored bundle
//! 4. XSTS authorization for the package audience, kept in memory only
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mx_auth::{AuthConfig, FileCredentialStore, IdentityContext, StaticSignInPrompt, XblAuthClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = XblAuthClient::new(AuthConfig::xbox_live()?)?;
//!     println!("Visit: {}", client.build_sign_in_url());
//!
//!     let store = Arc::new(FileCredentialStore::new(FileCredentialStore::default_path()?));
//!     let prompt = Arc::new(StaticSignInPrompt::new("https://login.live.com/oauth20_desktop.srf#access_token=..."));
//!     let context = IdentityContext::new(client, store, prompt);
//!
//!     context.initialize().await?;
//!     let token = context.ensure_service_token().await?;
//!     println!("Authorization: {}", token.authorization_header());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Token Storage
//!
//! ```
//! use mx_auth::{CredentialBundle, CredentialStore, LiveTokens, MemoryCredentialStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = MemoryCredentialStore::new();
//! let bundle = CredentialBundle::new(LiveTokens::new("token".to_string(), None, 3600, None));
//!
//! store.save(&bundle).await?;
//! assert_eq!(store.load().await, Some(bundle));
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```
//!
//! # Important Notes
//!
//! - The stored bundle is plain JSON; keep the file private to the user
//! - Tokens should never be logged
//! - The redirect of the live desktop flow carries no refresh token, a
//!   placeholder is substituted so the exchange accepts it

pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod file_store;
pub mod models;
pub mod prompt;
pub mod store;
pub mod tokens;

// Re-export main types
pub use client::{parse_sign_in_redirect, with_refresh_token_placeholder, XblAuthClient};
pub use config::{AuthConfig, Endpoints, HttpTimeouts};
pub use context::{AuthState, IdentityContext};
pub use errors::{AuthError, Result, XstsError};
pub use file_store::FileCredentialStore;
pub use prompt::{NoSignInPrompt, SignInPrompt, StaticSignInPrompt};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use tokens::{CredentialBundle, LiveTokens, SignInResponse, XToken};
