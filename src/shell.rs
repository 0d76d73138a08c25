use std::io::{self, Write};

use mx_auth::IdentityContext;
use mx_package::{resolve_download_links, DownloadLink, PackageClient, PackageError};

use crate::prompt::read_line;

const CONTENT_ID_PROMPT: &str =
    "Please enter the ContentId of the package you want to fetch download links for:";

/// Single-line diagnostic for a failed lookup
pub fn diagnostic(error: &PackageError) -> String {
    match error {
        PackageError::InvalidArgument(_) => "Error: You entered an invalid content id.".to_string(),
        PackageError::AuthenticationRequired | PackageError::AuthenticationFailed(_) => format!(
            "Could not regenerate update token. Please restart the app and reauthenticate! ({error})"
        ),
        PackageError::RemoteError { status } => {
            format!("Failed to fetch package information. Status Code: {status}")
        }
        PackageError::MalformedResponse(e) => format!("Error while parsing server response: {e}"),
        PackageError::PackageNotFound { .. } => {
            "Error: Server did not find requested package.".to_string()
        }
        PackageError::Network(e) => format!("Failed to fetch package information: {e}"),
        PackageError::UrlParse(e) => format!("Error: Could not build package URL: {e}"),
    }
}

/// Bare URLs in single-shot mode, `name | size | url` lines otherwise
pub fn write_links(out: &mut impl Write, links: &[DownloadLink], bare: bool) -> io::Result<()> {
    for link in links {
        if bare {
            writeln!(out, "{}", link.url)?;
        } else {
            writeln!(out, "{link}")?;
        }
    }
    Ok(())
}

/// Interactive report for one lookup
///
/// A not-found answer still came back from the server, so it is announced
/// like a successful response before the diagnostic.
pub fn write_outcome(
    out: &mut impl Write,
    outcome: &Result<Vec<DownloadLink>, PackageError>,
) -> io::Result<()> {
    match outcome {
        Ok(links) => {
            writeln!(out, "Got response!")?;
            write_links(out, links, false)
        }
        Err(e @ PackageError::PackageNotFound { .. }) => {
            writeln!(out, "Got response!")?;
            writeln!(out, "{}", diagnostic(e))
        }
        Err(e) => writeln!(out, "{}", diagnostic(e)),
    }
}

pub struct Shell {
    identity: IdentityContext,
    client: PackageClient,
}

impl Shell {
    pub fn new(identity: IdentityContext, client: PackageClient) -> Self {
        Self { identity, client }
    }

    /// Resolve one content id, printing bare URLs
    pub async fn run_single(&self, content_id: &str) -> Result<(), PackageError> {
        let links = resolve_download_links(&self.identity, &self.client, content_id).await?;
        // stdout going away is not a lookup failure
        let _ = write_links(&mut io::stdout().lock(), &links, true);
        Ok(())
    }

    /// Prompt for content ids until end of input
    pub async fn run_interactive(&self) -> io::Result<()> {
        loop {
            println!("{CONTENT_ID_PROMPT}");

            let Some(line) = read_line().await? else {
                return Ok(());
            };
            let content_id = line.trim();
            if content_id.is_empty() {
                continue;
            }

            let outcome = resolve_download_links(&self.identity, &self.client, content_id).await;
            write_outcome(&mut io::stdout().lock(), &outcome)?;
        }
    }
}
