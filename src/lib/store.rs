//! Staged download files.
//!
//! A [`StagedFile`] receives the bytes of an in-flight download at a scratch location.
//! Exactly one of [`commit`](StagedFile::commit) or [`rollback`](StagedFile::rollback)
//! finishes it, enforced by move semantics: commit makes the fully-written bytes
//! readable (and, for durable files, visible at the permanent cache path), rollback
//! discards the scratch file. No reader can ever observe a partially-written file at
//! a permanent path.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::error::Error;

/// A fully-written download, readable from offset zero.
#[derive(Debug)]
pub struct Committed {
    path: PathBuf,
    file: File,
}

impl Committed {
    /// Open a file that is already at its permanent path, e.g. a cached archive from a
    /// previous run.
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let file = File::open(&path)?;
        Ok(Self { path, file })
    }

    /// Where the committed bytes live. For ephemeral staged files this is only a label
    /// for log messages; no file exists there.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for Committed {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for Committed {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

/// A write handle whose final location only becomes visible on commit.
#[derive(Debug)]
pub enum StagedFile {
    /// Anonymous scratch file. Nothing persists once the handle is gone; the carried
    /// path is a display label only.
    Ephemeral { label: PathBuf, file: File },
    /// Named temporary file in the same directory as `dest`, so that commit is a
    /// rename on one filesystem rather than a copy.
    Durable {
        temp: tempfile::NamedTempFile,
        dest: PathBuf,
    },
}

impl StagedFile {
    /// Stage a download that will not outlive this run.
    pub fn ephemeral(file_name: &str) -> io::Result<Self> {
        Ok(Self::Ephemeral {
            label: std::env::temp_dir().join(file_name),
            file: tempfile::tempfile()?,
        })
    }

    /// Stage a download that commits to `dest`, creating the parent directory if needed.
    pub fn durable(dest: PathBuf) -> io::Result<Self> {
        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no parent directory", dest.display()),
                )
            })?;
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .suffix(&format!("_{file_name}"))
            .tempfile_in(dir)?;
        Ok(Self::Durable { temp, dest })
    }

    /// The path the file will have once committed (a display label for ephemeral files).
    pub fn dest_path(&self) -> &Path {
        match self {
            Self::Ephemeral { label, .. } => label,
            Self::Durable { dest, .. } => dest,
        }
    }

    /// Finish writing. Ephemeral files are rewound for reading; durable files are
    /// atomically renamed to their permanent path and reopened read-only. If the
    /// rename fails the scratch file is deleted and the error propagates.
    pub fn commit(self) -> Result<Committed, Error> {
        match self {
            Self::Ephemeral { label, mut file } => {
                file.seek(SeekFrom::Start(0))?;
                Ok(Committed { path: label, file })
            }
            Self::Durable { temp, dest } => {
                tracing::info!("renaming {} to {}", temp.path().display(), dest.display());
                match temp.persist(&dest) {
                    Ok(written) => drop(written),
                    Err(err) => {
                        tracing::info!("deleting {}", err.file.path().display());
                        let error = err.error;
                        let _ = err.file.close();
                        return Err(error.into());
                    }
                }
                let file = File::open(&dest)?;
                Ok(Committed { path: dest, file })
            }
        }
    }

    /// Discard the scratch file. A failed delete propagates as a secondary error.
    pub fn rollback(self) -> io::Result<()> {
        match self {
            Self::Ephemeral { file, .. } => {
                drop(file);
                Ok(())
            }
            Self::Durable { temp, .. } => {
                tracing::info!("deleting {}", temp.path().display());
                temp.close()
            }
        }
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Ephemeral { file, .. } => file.write(buf),
            Self::Durable { temp, .. } => temp.as_file_mut().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Ephemeral { file, .. } => file.flush(),
            Self::Durable { temp, .. } => temp.as_file_mut().flush(),
        }
    }
}

#[cfg(test)]
mod test_staged_files {
    use super::*;

    #[test]
    fn durable_commit_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pkg_1.0.zip");

        let mut staged = StagedFile::durable(dest.clone()).unwrap();
        staged.write_all(b"payload").unwrap();
        let mut committed = staged.commit().unwrap();

        assert_eq!(committed.path(), dest);
        let mut contents = String::new();
        committed.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "payload");

        // The scratch file is gone; only the committed file remains.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn durable_rollback_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pkg_1.0.zip");

        let mut staged = StagedFile::durable(dest.clone()).unwrap();
        staged.write_all(b"partial download").unwrap();
        staged.rollback().unwrap();

        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn durable_creates_missing_cache_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache/subdir/pkg_1.0.zip");

        let staged = StagedFile::durable(dest.clone()).unwrap();
        assert!(dest.parent().unwrap().is_dir());
        staged.rollback().unwrap();
    }

    #[test]
    fn ephemeral_commit_is_readable_from_the_start() {
        let mut staged = StagedFile::ephemeral("pkg_1.0.zip").unwrap();
        staged.write_all(b"payload").unwrap();
        let mut committed = staged.commit().unwrap();

        let mut contents = String::new();
        committed.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "payload");
    }
}
