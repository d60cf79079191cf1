//! Shared types: the hook error, release payloads and resolved binaries
//!
//! Every backend reports failures through `HookError`; the CLI layer adds
//! context with anyhow and turns formatter failures into exit codes.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while locating, fetching or running dfixxer
#[derive(Debug, Error)]
pub enum HookError {
    /// Release metadata or asset could not be retrieved
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Host platform unknown, or no release asset matches it
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Release tag that cannot name a cache entry
    #[error("invalid release tag {0:?}")]
    InvalidReleaseTag(String),

    /// Downloaded archive is unreadable or lacks the binary
    #[error("{0}")]
    Archive(String),

    /// Downloaded bytes do not match the published digest
    #[error("sha256 mismatch for {asset}: expected {expected}, got {actual}")]
    Integrity {
        asset: String,
        expected: String,
        actual: String,
    },

    #[error("{message}: {path}")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An explicitly configured binary does not exist
    #[error("dfixxer binary not found: {0}")]
    BinaryNotFound(PathBuf),

    #[error("failed to run {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// dfixxer ran and reported failure
    #[error("dfixxer exited with code {code}")]
    FormatterFailed { code: i32 },
}

impl HookError {
    pub fn network(message: impl Into<String>, source: reqwest::Error) -> Self {
        HookError::Network {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn io(message: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        HookError::Io {
            message: message.into(),
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type HookResult<T> = std::result::Result<T, HookError>;

/// A single downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,

    #[serde(rename = "browser_download_url")]
    pub download_url: String,

    /// Digest published by GitHub, e.g. `sha256:ab12...`
    #[serde(default)]
    pub digest: Option<String>,

    #[serde(default)]
    pub size: u64,
}

impl ReleaseAsset {
    /// Expected SHA-256 in lowercase hex, if the release publishes one
    pub fn sha256(&self) -> Option<String> {
        self.digest
            .as_deref()
            .and_then(|d| d.strip_prefix("sha256:"))
            .map(|hex| hex.to_ascii_lowercase())
    }

    pub fn is_zip(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".zip")
    }
}

/// Release payload of `GET /repos/{owner}/{repo}/releases/tags/{tag}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Release {
    pub tag_name: String,

    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Where a resolved binary came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySource {
    Override,
    Path,
    Cache,
    Download,
}

impl fmt::Display for BinarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinarySource::Override => "override",
            BinarySource::Path => "path",
            BinarySource::Cache => "cache",
            BinarySource::Download => "download",
        };
        f.write_str(s)
    }
}

/// A dfixxer executable ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinary {
    pub path: PathBuf,
    pub source: BinarySource,
}

impl ResolvedBinary {
    pub fn new(path: impl Into<PathBuf>, source: BinarySource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
