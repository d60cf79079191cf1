//! Locator - Find dfixxer on PATH or in the cache, fetching as a last resort

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::backends::fetch::fetch;
use crate::backends::release::ReleaseSource;
use crate::cache::store::CacheStore;
use crate::core::model::{BinarySource, HookError, HookResult, ResolvedBinary};
use crate::core::platform::Platform;
use crate::core::util::find_on_path;

/// Command name looked up on PATH
pub const DFIXXER_COMMAND: &str = "dfixxer";

/// Find a working dfixxer on PATH.
///
/// A candidate only counts if `dfixxer --version` exits successfully.
pub fn locate_on_path() -> Option<PathBuf> {
    let path = find_on_path(DFIXXER_COMMAND)?;
    if responds_to_version(&path) {
        debug!("Found dfixxer on PATH: {}", path.display());
        Some(path)
    } else {
        debug!("Ignoring {}: --version failed", path.display());
        None
    }
}

fn responds_to_version(path: &Path) -> bool {
    Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Settings deciding where dfixxer may come from
#[derive(Debug, Clone)]
pub struct Resolver {
    pub cache_root: PathBuf,
    pub release_tag: String,
    /// Consult PATH before the cache
    pub search_path: bool,
    /// Use this binary and skip every other lookup
    pub binary_override: Option<PathBuf>,
}

impl Resolver {
    /// Cache store for `platform`
    pub fn store(&self, platform: &Platform) -> HookResult<CacheStore> {
        CacheStore::new(&self.cache_root, &self.release_tag, platform.binary_name())
    }

    /// Override, then PATH, then cache, then download
    pub fn resolve(&self, source: &dyn ReleaseSource) -> HookResult<ResolvedBinary> {
        if let Some(binary) = &self.binary_override {
            return resolve_override(binary);
        }

        if self.search_path {
            if let Some(path) = locate_on_path() {
                return Ok(ResolvedBinary::new(path, BinarySource::Path));
            }
        }

        let platform = Platform::detect()?;
        self.resolve_cached(&platform, source)
    }

    /// Cache first, download on a miss. A cache hit never touches `source`.
    pub fn resolve_cached(
        &self,
        platform: &Platform,
        source: &dyn ReleaseSource,
    ) -> HookResult<ResolvedBinary> {
        let store = self.store(platform)?;
        if let Some(path) = store.cached_binary() {
            debug!("Using cached dfixxer: {}", path.display());
            return Ok(ResolvedBinary::new(path, BinarySource::Cache));
        }

        let path = fetch(source, &store, platform)?;
        Ok(ResolvedBinary::new(path, BinarySource::Download))
    }
}

/// Accept an existing file, or a command name found on PATH
fn resolve_override(binary: &Path) -> HookResult<ResolvedBinary> {
    if binary.is_file() {
        return Ok(ResolvedBinary::new(binary, BinarySource::Override));
    }
    which::which(binary)
        .map(|path| ResolvedBinary::new(path, BinarySource::Override))
        .map_err(|_| HookError::BinaryNotFound(binary.to_path_buf()))
}
