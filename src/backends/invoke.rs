//! Invoker - Run `dfixxer update` over the staged files

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::core::model::{HookError, HookResult};

/// Run `<binary> update <files>...` once with every file.
///
/// The formatter's output is captured; on failure it is forwarded to stderr
/// and the formatter's exit code is returned as `FormatterFailed`.
pub fn run_update(binary: &Path, files: &[PathBuf]) -> HookResult<()> {
    debug!("Running {} update on {} file(s)", binary.display(), files.len());

    let output = Command::new(binary)
        .arg("update")
        .args(files)
        .output()
        .map_err(|source| HookError::Spawn {
            path: binary.to_path_buf(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if output.status.success() {
        if !stdout.trim().is_empty() {
            debug!("dfixxer: {}", stdout.trim_end());
        }
        return Ok(());
    }

    eprintln!("dfixxer failed on {} file(s):", files.len());
    if !stderr.trim().is_empty() {
        eprintln!("{}", stderr.trim_end());
    }
    if !stdout.trim().is_empty() {
        eprintln!("{}", stdout.trim_end());
    }

    // Killed by a signal: no code to forward
    let code = output.status.code().filter(|c| *c != 0).unwrap_or(1);
    Err(HookError::FormatterFailed { code })
}
