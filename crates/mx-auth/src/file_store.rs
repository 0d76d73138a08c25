use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::store::CredentialStore;
use crate::tokens::CredentialBundle;

/// File name of the persisted bundle, next to the executable
pub const TOKEN_FILENAME: &str = "token.json";

/// JSON file credential store
///
/// Holds a single bundle at a fixed path. Tokens are stored in plain text,
/// the file is restricted to the owning user on Unix.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<executable directory>/token.json`
    pub fn default_path() -> Result<PathBuf> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(TOKEN_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_bundle(&self) -> Result<Option<CredentialBundle>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let bundle: CredentialBundle = serde_json::from_str(&content)?;
        Ok(Some(bundle))
    }
}

#[async_trait::async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Option<CredentialBundle> {
        match self.read_bundle().await {
            Ok(bundle) => {
                debug!(path = %self.path.display(), found = bundle.is_some(), "Loaded credential bundle");
                bundle
            }
            Err(e) => {
                warn!("Ignoring unreadable credential file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    async fn save(&self, bundle: &CredentialBundle) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(bundle)?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        let mut file = create_private(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), "Saved credential bundle");

        Ok(())
    }
}

/// Opens `path` for writing, truncated and readable by the owner only
///
/// The mode is applied at creation and reapplied to a leftover file, so token
/// bytes never land in a file other users can read.
async fn create_private(path: &Path) -> Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let file = options.open(path).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }

    Ok(file)
}
