//! Cache metadata management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stored next to a cached binary as `meta.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    /// Release tag the binary was fetched from
    pub release_tag: String,

    /// Name of the release asset that was downloaded
    pub asset_name: String,

    pub download_url: String,

    /// SHA-256 of the installed binary
    pub sha256: String,

    pub fetched_at: DateTime<Utc>,

    /// Version of dfixxer-hook that performed the fetch
    pub hook_version: String,
}

impl CacheMeta {
    pub fn new(release_tag: &str, asset_name: &str, download_url: &str, sha256: &str) -> Self {
        Self {
            release_tag: release_tag.to_string(),
            asset_name: asset_name.to_string(),
            download_url: download_url.to_string(),
            sha256: sha256.to_string(),
            fetched_at: Utc::now(),
            hook_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Metadata file name
pub const META_FILE: &str = "meta.json";
