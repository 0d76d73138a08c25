use std::path::PathBuf;

use mx_auth::SignInPrompt;
use tracing::{debug, warn};
use url::Url;

use crate::settings::executable_dir;

/// Optional file whose content replaces the pasted redirect URL
pub const AUTH_URL_FILENAME: &str = "authUrl.txt";

/// Read one line from stdin, `None` at end of input
pub async fn read_line() -> std::io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let read = std::io::stdin().read_line(&mut line)?;
        Ok::<_, std::io::Error>((read > 0).then(|| line.trim_end_matches(['\r', '\n']).to_string()))
    })
    .await
    .map_err(std::io::Error::other)?
}

/// Sign-in prompt on the console
///
/// Shows the sign-in URL and reads the redirect URL back from stdin, unless
/// an `authUrl.txt` override file exists.
#[derive(Debug, Clone)]
pub struct ConsoleSignInPrompt {
    override_files: Vec<PathBuf>,
    interactive: bool,
}

impl ConsoleSignInPrompt {
    /// Without an explicit file, the working directory is checked before the executable directory
    pub fn new(explicit: Option<PathBuf>, interactive: bool) -> Self {
        let override_files = match explicit {
            Some(path) => vec![path],
            None => std::iter::once(PathBuf::from(AUTH_URL_FILENAME))
                .chain(executable_dir().map(|dir| dir.join(AUTH_URL_FILENAME)))
                .collect(),
        };

        Self {
            override_files,
            interactive,
        }
    }

    fn override_url(&self) -> Option<String> {
        let path = self.override_files.iter().find(|path| path.is_file())?;
        debug!("Reading sign-in redirect from {}", path.display());

        match std::fs::read_to_string(path) {
            Ok(content) => Some(content.trim().to_string()),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl SignInPrompt for ConsoleSignInPrompt {
    async fn redirect_url(&self, sign_in_url: &Url) -> Option<String> {
        let instructions = format!(
            "Please sign-in at this url in your browser, then paste the resulting URL back into this window and press enter.\nUrl: {sign_in_url}"
        );
        // Single-shot output on stdout is reserved for links
        if self.interactive {
            println!("{instructions}");
        } else {
            eprintln!("{instructions}");
        }

        if let Some(url) = self.override_url() {
            return Some(url);
        }

        match read_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read sign-in redirect: {}", e);
                None
            }
        }
    }
}
