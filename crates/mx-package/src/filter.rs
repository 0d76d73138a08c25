use std::fmt;

use tracing::debug;

use crate::errors::{PackageError, Result};
use crate::models::{PackageFile, PackageQueryResult};

/// A file of the package with its direct download URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub file_name: String,
    pub size: u64,
    pub url: String,
}

impl fmt::Display for DownloadLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | Size: {} | Link: {}", self.file_name, self.size, self.url)
    }
}

fn is_excluded(file_name: &str, excluded_extensions: &[String]) -> bool {
    let name = file_name.to_ascii_lowercase();
    excluded_extensions
        .iter()
        .any(|ext| name.ends_with(&ext.to_ascii_lowercase()))
}

fn download_url(file: &PackageFile) -> Option<String> {
    let root = file.cdn_root_paths.first()?;
    let relative = file.relative_url.as_deref()?;
    Some(format!("{root}{relative}"))
}

/// Pick the files worth downloading and build one link per file
///
/// An unknown package is an error. Files without a CDN root or a relative
/// URL are skipped, so a found package can still yield an empty list.
pub fn select_download_links(
    result: &PackageQueryResult,
    excluded_extensions: &[String],
) -> Result<Vec<DownloadLink>> {
    if !result.package_found {
        return Err(PackageError::PackageNotFound {
            content_id: result.content_id.map(|id| id.to_string()),
        });
    }

    let links = result
        .package_files
        .iter()
        .filter(|file| !is_excluded(&file.file_name, excluded_extensions))
        .filter_map(|file| {
            let url = download_url(file);
            if url.is_none() {
                debug!(file = %file.file_name, "Skipping file without CDN root or relative URL");
            }
            url.map(|url| DownloadLink {
                file_name: file.file_name.clone(),
                size: file.file_size,
                url,
            })
        })
        .collect();

    Ok(links)
}
