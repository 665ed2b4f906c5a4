//! The fetch → verify → extract → normalize → patch → stamp pipeline.

use std::fs;
use std::io;
use std::path::PathBuf;

use super::archive;
use super::digest;
use super::error::Error;
use super::patch::{self, Patch};
use super::stamp::Stamp;
use super::store::{Committed, StagedFile};

/// File name of the marker written inside the destination directory after a fully
/// successful run.
pub const STAMP_FILE_NAME: &str = "dep-vendor.stamp.json";

/// Everything needed to materialize one package: what it is, where it comes from,
/// where it goes, and which patches to apply afterwards. Immutable for the lifetime
/// of one run.
#[derive(Debug)]
pub struct FetchSpec {
    pub package_name: String,
    pub package_version: String,
    pub download_url: String,
    /// Expected lowercase hex SHA-256 of the downloaded archive.
    pub expected_sha256: String,
    /// The directory the normalized source tree ends up in.
    pub dest_dir: PathBuf,
    /// Downloaded archives are kept here across runs; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    /// Must be set whenever `patches` is non-empty.
    pub patch_executable: Option<PathBuf>,
    /// Applied in order after extraction.
    pub patches: Vec<Patch>,
}

/// Fetches, verifies, unpacks, patches and stamps a single package.
///
/// One instance runs one package start to finish on the calling thread; there are no
/// internal retries anywhere. Resilience comes from re-running: any failure leaves the
/// destination without a stamp, and the next run wipes it and starts over.
pub struct Downloader {
    spec: FetchSpec,
    stamp_file: PathBuf,
    stamp: Stamp,
}

impl Downloader {
    pub fn new(spec: FetchSpec) -> Self {
        let stamp_file = spec.dest_dir.join(STAMP_FILE_NAME);
        let stamp = Stamp {
            package_name: spec.package_name.clone(),
            package_version: spec.package_version.clone(),
            package_sha256: Some(spec.expected_sha256.clone()),
            patch_executable: spec.patch_executable.as_ref().map(|p| {
                std::path::absolute(p)
                    .unwrap_or_else(|_| p.clone())
                    .display()
                    .to_string()
            }),
            patch_sha256s: spec.patches.iter().map(|p| p.sha256.clone()).collect(),
        };
        Self {
            spec,
            stamp_file,
            stamp,
        }
    }

    /// Run the whole pipeline. A valid stamp makes this a no-op.
    pub fn run(&self) -> Result<(), Error> {
        if self.stamp_file_is_valid() {
            tracing::info!(
                "stamp file {} is valid; nothing to do",
                self.stamp_file.display()
            );
            return Ok(());
        }

        // Every non-cached run starts from an empty destination; partial trees from
        // interrupted runs are never merged.
        if self.spec.dest_dir.exists() {
            tracing::info!("deleting {}", self.spec.dest_dir.display());
            fs::remove_dir_all(&self.spec.dest_dir)?;
        }

        let mut archive_file = self.download()?;
        let archive_path = archive_file.path().to_path_buf();
        digest::verify(&mut archive_file, &archive_path, &self.spec.expected_sha256)?;

        tracing::info!(
            "unzipping {} to {}",
            archive_path.display(),
            self.spec.dest_dir.display()
        );
        archive::extract(&mut archive_file, &self.spec.dest_dir)?;
        archive::flatten_single_subdir(&self.spec.dest_dir)?;

        match &self.spec.patch_executable {
            Some(executable) => {
                patch::apply_all(&self.spec.patches, executable, &self.spec.dest_dir)?;
            }
            None => debug_assert!(self.spec.patches.is_empty()),
        }

        self.write_stamp_file()?;
        Ok(())
    }

    fn stamp_file_is_valid(&self) -> bool {
        if !self.stamp_file.exists() {
            return false;
        }

        tracing::info!("validating stamp file: {}", self.stamp_file.display());
        let stamp = match Stamp::load(&self.stamp_file) {
            Ok(stamp) => stamp,
            Err(err) => {
                tracing::info!(
                    "validating stamp file {} failed: {err}",
                    self.stamp_file.display()
                );
                return false;
            }
        };

        if !stamp.same_package(&self.stamp) {
            tracing::info!(
                "validating stamp file {} failed: stamp does not match the requested package",
                self.stamp_file.display()
            );
            return false;
        }

        true
    }

    fn write_stamp_file(&self) -> Result<(), Error> {
        tracing::info!("writing stamp to {}", self.stamp_file.display());
        self.stamp.save(&self.stamp_file)
    }

    fn cache_file_name(&self) -> String {
        format!(
            "{}_{}.zip",
            self.spec.package_name, self.spec.package_version
        )
    }

    /// Produce the archive as a committed, readable file: either straight from the
    /// cache, or downloaded through a staged file that is rolled back on any failure
    /// so no partial archive ever lands at a durable path.
    fn download(&self) -> Result<Committed, Error> {
        let file_name = self.cache_file_name();
        let mut staged = match &self.spec.cache_dir {
            None => StagedFile::ephemeral(&file_name)?,
            Some(cache_dir) => {
                let cached = cache_dir.join(&file_name);
                if cached.exists() {
                    tracing::info!("using previously-downloaded file {}", cached.display());
                    return Ok(Committed::open(cached)?);
                }
                StagedFile::durable(cached)?
            }
        };

        if let Err(err) = self.fetch_url(&mut staged) {
            staged.rollback()?;
            return Err(err);
        }
        staged.commit()
    }

    fn fetch_url(&self, staged: &mut StagedFile) -> Result<(), Error> {
        tracing::info!(
            "downloading {} to {}",
            self.spec.download_url,
            staged.dest_path().display()
        );

        let mut response =
            reqwest::blocking::get(&self.spec.download_url)?.error_for_status()?;
        if let Some(content_length) = response.content_length() {
            // Progress reporting only; never trusted for allocation or verification.
            tracing::info!("downloading {content_length} bytes");
        }

        let downloaded = io::copy(&mut response, staged)?;
        tracing::info!(
            "downloaded {downloaded} bytes from {}",
            self.spec.download_url
        );
        Ok(())
    }
}

#[cfg(test)]
mod test_stamp_validation {
    use super::*;

    // A spec whose URL would fail instantly if anything tried to contact it.
    fn downloader(dest_dir: PathBuf) -> Downloader {
        Downloader::new(FetchSpec {
            package_name: "googletest".to_owned(),
            package_version: "1.14.0".to_owned(),
            download_url: "http://127.0.0.1:1/unused.zip".to_owned(),
            expected_sha256: "ab".repeat(32),
            dest_dir,
            cache_dir: None,
            patch_executable: None,
            patches: Vec::new(),
        })
    }

    #[test]
    fn missing_stamp_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!downloader(dir.path().to_path_buf()).stamp_file_is_valid());
    }

    #[test]
    fn freshly_written_stamp_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = downloader(dir.path().to_path_buf());
        downloader.write_stamp_file().unwrap();
        assert!(downloader.stamp_file_is_valid());
    }

    #[test]
    fn corrupt_stamp_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = downloader(dir.path().to_path_buf());
        fs::write(dir.path().join(STAMP_FILE_NAME), "{ truncated").unwrap();
        assert!(!downloader.stamp_file_is_valid());
    }

    #[test]
    fn stamp_for_another_version_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = downloader(dir.path().to_path_buf());
        let other = Stamp {
            package_name: "googletest".to_owned(),
            package_version: "1.15.0".to_owned(),
            package_sha256: None,
            patch_executable: None,
            patch_sha256s: Vec::new(),
        };
        other.save(&dir.path().join(STAMP_FILE_NAME)).unwrap();
        assert!(!downloader.stamp_file_is_valid());
    }

    #[test]
    fn stamp_with_different_digest_still_matches() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = downloader(dir.path().to_path_buf());
        let recorded = Stamp {
            package_name: "googletest".to_owned(),
            package_version: "1.14.0".to_owned(),
            package_sha256: Some("ef".repeat(32)),
            patch_executable: Some("/somewhere/else/patch".to_owned()),
            patch_sha256s: vec!["12".repeat(32)],
        };
        recorded.save(&dir.path().join(STAMP_FILE_NAME)).unwrap();
        assert!(downloader.stamp_file_is_valid());
    }
}
