use std::sync::{Arc, RwLock};

use crate::errors::{AuthError, Result};
use crate::tokens::CredentialBundle;

/// Trait for persisting the credential bundle between runs
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored bundle
    ///
    /// A missing or unreadable bundle is `None`, same as never having signed in.
    async fn load(&self) -> Option<CredentialBundle>;

    /// Replace the stored bundle
    async fn save(&self, bundle: &CredentialBundle) -> Result<()>;
}

/// In-memory credential store for testing and simple use cases
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    bundle: Arc<RwLock<Option<CredentialBundle>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(bundle: CredentialBundle) -> Self {
        Self {
            bundle: Arc::new(RwLock::new(Some(bundle))),
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Option<CredentialBundle> {
        self.bundle.read().ok()?.clone()
    }

    async fn save(&self, bundle: &CredentialBundle) -> Result<()> {
        *self
            .bundle
            .write()
            .map_err(|_| AuthError::InvalidResponse("Lock poisoned".to_string()))? =
            Some(bundle.clone());
        Ok(())
    }
}
