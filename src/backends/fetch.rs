//! Fetcher - Download the dfixxer release asset into the cache

use sha2::{Digest, Sha256};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::backends::archive::extract_binary;
use crate::backends::release::{select_asset, ReleaseSource};
use crate::cache::meta::CacheMeta;
use crate::cache::store::CacheStore;
use crate::core::model::{HookError, HookResult};
use crate::core::platform::Platform;
use crate::core::util::sha256_file;

/// Writer adapter hashing everything that passes through it
struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Download dfixxer for `platform` into `store` and return the binary path.
///
/// Nothing is installed unless the download completes, matches the
/// published digest, and (for zip assets) contains the binary.
pub fn fetch(source: &dyn ReleaseSource, store: &CacheStore, platform: &Platform) -> HookResult<PathBuf> {
    let tag = store.release_tag();
    info!("dfixxer not found, downloading {} for {}...", tag, platform);

    let release = source.release(tag)?;
    debug!("Release {} lists {} asset(s)", release.tag_name, release.assets.len());
    let asset = select_asset(&release, platform, tag)?;
    if asset.size > 0 {
        info!("Downloading {} ({} bytes)...", asset.download_url, asset.size);
    } else {
        info!("Downloading {}...", asset.download_url);
    }

    let mut staged = store.staging_file()?;
    let staged_path = staged.path().to_path_buf();
    let mut writer = HashingWriter::new(staged.as_file_mut());
    let bytes = source.download(asset, &mut writer)?;
    writer
        .flush()
        .map_err(|e| HookError::io("failed to write download", &staged_path, e))?;
    let digest = writer.finish();

    if let Some(expected) = asset.sha256() {
        if expected != digest {
            return Err(HookError::Integrity {
                asset: asset.name.clone(),
                expected,
                actual: digest,
            });
        }
    }

    let installed = if asset.is_zip() {
        let mut binary = store.staging_file()?;
        extract_binary(staged.path(), store.binary_name(), binary.as_file_mut())?;
        // The archive itself is removed when `staged` drops
        store.install(binary)?
    } else {
        store.install(staged)?
    };

    let sha256 = if asset.is_zip() {
        sha256_file(&installed)
            .map_err(|e| HookError::io("failed to hash binary", &installed, e))?
    } else {
        digest
    };

    let meta = CacheMeta::new(tag, &asset.name, &asset.download_url, &sha256);
    if let Err(e) = store.write_meta(&meta) {
        warn!("Could not record cache metadata: {}", e);
    }

    info!(
        "Downloaded dfixxer ({} bytes) to {}",
        bytes,
        installed.display()
    );
    Ok(installed)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::model::{Release, ReleaseAsset};
    use crate::core::util::is_executable;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::io::Cursor;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    /// In-memory release source counting every call
    pub(crate) struct FakeSource {
        pub release: Release,
        pub blobs: HashMap<String, Vec<u8>>,
        pub calls: Cell<usize>,
    }

    impl FakeSource {
        pub fn new(assets: Vec<(ReleaseAsset, Vec<u8>)>) -> Self {
            let mut blobs = HashMap::new();
            let mut release = Release {
                tag_name: "v0.9.2".to_string(),
                assets: Vec::new(),
            };
            for (asset, data) in assets {
                blobs.insert(asset.download_url.clone(), data);
                release.assets.push(asset);
            }
            Self {
                release,
                blobs,
                calls: Cell::new(0),
            }
        }
    }

    impl ReleaseSource for FakeSource {
        fn release(&self, _tag: &str) -> HookResult<Release> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.release.clone())
        }

        fn download(&self, asset: &ReleaseAsset, sink: &mut dyn Write) -> HookResult<u64> {
            self.calls.set(self.calls.get() + 1);
            let data = self.blobs.get(&asset.download_url).ok_or(HookError::Network {
                message: format!("no such asset {}", asset.name),
                source: None,
            })?;
            sink.write_all(data).unwrap();
            Ok(data.len() as u64)
        }
    }

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    pub(crate) fn asset(name: &str, digest: Option<String>) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            download_url: format!("https://example.invalid/{}", name),
            digest,
            size: 0,
        }
    }

    fn linux() -> Platform {
        Platform::from_parts("linux", "x86_64").unwrap()
    }

    fn zip_with(name: &str, data: &[u8]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_fetch_plain_binary_is_executable() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        let source = FakeSource::new(vec![(asset("dfixxer-linux-x86_64", None), b"ELF".to_vec())]);

        let path = fetch(&source, &store, &linux()).unwrap();

        assert_eq!(path, store.binary_path());
        assert_eq!(std::fs::read(&path).unwrap(), b"ELF");
        assert!(is_executable(&path));

        let meta = store.read_meta().unwrap();
        assert_eq!(meta.asset_name, "dfixxer-linux-x86_64");
        assert_eq!(meta.sha256, sha256_hex(b"ELF"));
    }

    #[test]
    fn test_fetch_zip_extracts_and_drops_archive() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        let archive = zip_with("dist/dfixxer", b"ELF-from-zip");
        let source = FakeSource::new(vec![(asset("dfixxer-linux-x86_64-v0.9.2.zip", None), archive)]);

        let path = fetch(&source, &store, &linux()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"ELF-from-zip");
        assert!(is_executable(&path));

        let mut names: Vec<_> = std::fs::read_dir(store.entry_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["dfixxer".to_string(), "meta.json".to_string()]);
        assert_eq!(store.read_meta().unwrap().sha256, sha256_hex(b"ELF-from-zip"));
    }

    #[test]
    fn test_fetch_verifies_digest() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        let good = format!("sha256:{}", sha256_hex(b"ELF"));
        let source = FakeSource::new(vec![(asset("dfixxer-linux-x86_64", Some(good)), b"ELF".to_vec())]);

        assert!(fetch(&source, &store, &linux()).is_ok());
    }

    #[test]
    fn test_fetch_digest_mismatch_installs_nothing() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        let wrong = format!("sha256:{}", sha256_hex(b"something else"));
        let source =
            FakeSource::new(vec![(asset("dfixxer-linux-x86_64", Some(wrong)), b"ELF".to_vec())]);

        let err = fetch(&source, &store, &linux()).unwrap_err();
        assert!(matches!(err, HookError::Integrity { .. }));
        assert_eq!(store.cached_binary(), None);
        assert_eq!(std::fs::read_dir(store.entry_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_fetch_unsupported_platform() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        let source = FakeSource::new(vec![(asset("dfixxer-windows-x86_64.exe", None), b"MZ".to_vec())]);

        let err = fetch(&source, &store, &linux()).unwrap_err();
        assert!(matches!(err, HookError::UnsupportedPlatform(_)));
        assert_eq!(store.cached_binary(), None);
    }

    #[test]
    fn test_fetch_zip_without_binary() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path(), "v0.9.2", "dfixxer").unwrap();
        let archive = zip_with("README.md", b"docs");
        let source = FakeSource::new(vec![(asset("dfixxer-linux-x86_64.zip", None), archive)]);

        let err = fetch(&source, &store, &linux()).unwrap_err();
        assert!(matches!(err, HookError::Archive(_)));
        assert_eq!(store.cached_binary(), None);
    }
}
