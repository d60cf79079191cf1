//! Cache and configuration path helpers
//!
//! The cache layout is `<cache root>/<release tag>/<binary name>`, with the
//! default cache root at `~/.cache/dfixxer-pre-commit`.

use std::path::{Component, Path, PathBuf};

use crate::core::model::{HookError, HookResult};

/// Directory name of the cache root under `~/.cache`
pub const CACHE_DIR_NAME: &str = "dfixxer-pre-commit";

/// Configuration file read by dfixxer itself
pub const CONFIG_FILE_NAME: &str = "dfixxer.toml";

/// Default cache root (`~/.cache/dfixxer-pre-commit`)
///
/// Falls back to a relative `.cache` when no home directory is known.
pub fn default_cache_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache")
        .join(CACHE_DIR_NAME)
}

/// Directory holding the binary for one release tag.
///
/// The tag must name a single directory below `cache_root`; empty tags,
/// `.` and `..` are rejected.
pub fn entry_dir(cache_root: &Path, release_tag: &str) -> HookResult<PathBuf> {
    let name = sanitize_tag(release_tag);
    let mut components = Path::new(&name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(cache_root.join(name)),
        _ => Err(HookError::InvalidReleaseTag(release_tag.to_string())),
    }
}

/// Keep tags usable as a single path component
fn sanitize_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c => c,
        })
        .collect()
}

/// Find `dfixxer.toml` in `start` or any of its ancestors
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}
