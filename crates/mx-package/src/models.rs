use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// GetBasePackage response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageQueryResult {
    pub package_found: bool,
    #[serde(default)]
    pub content_id: Option<Uuid>,
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub hash_of_hashes: Option<String>,
    #[serde(default)]
    pub package_files: Vec<PackageFile>,
    #[serde(default)]
    pub package_metadata: Option<PackageMetadata>,
}

/// One installable file of a package version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageFile {
    #[serde(default)]
    pub content_id: Option<Uuid>,
    #[serde(default)]
    pub version_id: Option<String>,
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_hash: Option<String>,
    /// Encrypted content key, passed through untouched
    #[serde(default)]
    pub key_blob: Option<String>,
    /// Only the first entry is used to build a link
    #[serde(default)]
    pub cdn_root_paths: Vec<String>,
    #[serde(default)]
    pub background_cdn_root_paths: Vec<String>,
    /// Files without one cannot be linked
    #[serde(default)]
    pub relative_url: Option<String>,
    #[serde(default)]
    pub update_type: u32,
    #[serde(default)]
    pub delta_version_id: Option<Uuid>,
    #[serde(default)]
    pub license_usage_type: u32,
    #[serde(default)]
    pub clock: u64,
    #[serde(default)]
    pub modified_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageMetadata {
    #[serde(default)]
    pub cdn_roots: Vec<String>,
    #[serde(default)]
    pub background_cdn_root_paths: Vec<String>,
    #[serde(default)]
    pub files: Vec<PackageMetadataFile>,
    #[serde(default)]
    pub estimated_total_download_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageMetadataFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub relative_url: Option<String>,
}
