//! Package metadata lookup for MSIXVC titles
//!
//! Queries the package service for a content id and turns the returned file
//! list into direct CDN download links.
//!
//! ```no_run
//! # async fn example(identity: &mx_auth::IdentityContext) -> Result<(), mx_package::PackageError> {
//! use mx_package::{resolve_download_links, PackageClient, PackageClientConfig};
//!
//! let client = PackageClient::new(PackageClientConfig::xbox_live()?)?;
//! for link in resolve_download_links(identity, &client, "1e2a4f6b-8c0d-4e1f-9a2b-3c4d5e6f7a8b").await? {
//!     println!("{}", link);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod content_id;
pub mod errors;
pub mod filter;
pub mod lookup;
pub mod models;

pub use client::PackageClient;
pub use config::{PackageClientConfig, EXCLUDED_EXTENSIONS, PACKAGE_SERVICE_BASE};
pub use content_id::ContentId;
pub use errors::{PackageError, Result};
pub use filter::{select_download_links, DownloadLink};
pub use lookup::resolve_download_links;
pub use models::{PackageFile, PackageMetadata, PackageMetadataFile, PackageQueryResult};
pub use reqwest::StatusCode;
