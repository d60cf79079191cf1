//! Zip extraction for archived release assets

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use crate::core::model::{HookError, HookResult};

/// Copy the entry named `binary_name` from the zip at `archive` into `out`.
///
/// Entries match on their last path component, ignoring ASCII case; the
/// first matching file wins.
pub fn extract_binary(archive: &Path, binary_name: &str, out: &mut dyn Write) -> HookResult<u64> {
    let file =
        File::open(archive).map_err(|e| HookError::io("failed to open archive", archive, e))?;
    let label = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive.display().to_string());
    extract_from(file, &label, binary_name, out)
}

fn extract_from<R: Read + Seek>(
    reader: R,
    label: &str,
    binary_name: &str,
    out: &mut dyn Write,
) -> HookResult<u64> {
    let mut zip = zip::ZipArchive::new(reader)
        .map_err(|e| HookError::Archive(format!("failed to read zip archive {}: {}", label, e)))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| HookError::Archive(format!("failed to read entry in {}: {}", label, e)))?;
        if entry.is_dir() {
            continue;
        }

        let file_name = entry.name().rsplit(['/', '\\']).next().unwrap_or("");
        if !file_name.eq_ignore_ascii_case(binary_name) {
            continue;
        }

        return std::io::copy(&mut entry, out).map_err(|e| {
            HookError::Archive(format!("failed to extract {} from {}: {}", binary_name, label, e))
        });
    }

    Err(HookError::Archive(format!(
        "zip archive {} does not contain {}",
        label, binary_name
    )))
}
