//! Unpacking downloaded archives and normalizing the extracted layout.
//!
//! Release archives wrap all of their content in a single versioned root folder
//! (`pkg-1.2.3/...`). After extraction the destination must therefore contain exactly
//! one top-level entry, and it must be a directory; [`flatten_single_subdir`] hoists
//! that directory's children up one level so the destination holds the sources
//! directly.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::error::Error;

/// The extracted tree does not have the expected single-subdirectory shape, which
/// means the archive was malformed or not laid out like a release archive at all.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("{dir} should contain exactly one subdirectory; however, it is completely empty")]
    Empty { dir: PathBuf },
    #[error(
        "{dir} contains more than one file/directory, but expected exactly one directory; \
         found {first} and {second}"
    )]
    MultipleEntries {
        dir: PathBuf,
        first: String,
        second: String,
    },
    #[error(
        "{dir} should contain exactly one subdirectory; however, it contained \
         a non-directory, {name}"
    )]
    NotADirectory { dir: PathBuf, name: String },
}

/// Unpack a zip archive into `dest_dir`, creating the directory (and any missing
/// parents) first. Entry-level reading is delegated to the zip crate, which also
/// rejects entries that would escape the destination.
pub fn extract<R: Read + Seek>(archive: R, dest_dir: &Path) -> Result<(), Error> {
    if !dest_dir.exists() {
        tracing::info!("creating directory: {}", dest_dir.display());
        fs::create_dir_all(dest_dir)?;
    }
    ZipArchive::new(archive)?.extract(dest_dir)?;
    Ok(())
}

/// Move every child of the destination's single subdirectory up one level, then remove
/// the emptied subdirectory. Each child move is an independent rename; a crash part-way
/// leaves a partially flattened tree, which the next run detects via the missing stamp
/// and redoes from a clean slate.
pub fn flatten_single_subdir(dest_dir: &Path) -> Result<(), Error> {
    let subdir = single_subdir(dest_dir)?;

    tracing::info!(
        "moving the contents of {} to its parent directory",
        subdir.display()
    );
    for entry in fs::read_dir(&subdir)? {
        let entry = entry?;
        let to = dest_dir.join(entry.file_name());
        tracing::debug!("moving {} to {}", entry.path().display(), to.display());
        fs::rename(entry.path(), &to)?;
    }

    tracing::debug!("deleting empty directory: {}", subdir.display());
    fs::remove_dir(&subdir)?;
    Ok(())
}

fn single_subdir(dest_dir: &Path) -> Result<PathBuf, Error> {
    let mut single: Option<fs::DirEntry> = None;
    for entry in fs::read_dir(dest_dir)? {
        let entry = entry?;
        match single {
            None => single = Some(entry),
            Some(first) => {
                return Err(LayoutError::MultipleEntries {
                    dir: dest_dir.to_path_buf(),
                    first: first.file_name().to_string_lossy().into_owned(),
                    second: entry.file_name().to_string_lossy().into_owned(),
                }
                .into());
            }
        }
    }

    let single = single.ok_or_else(|| LayoutError::Empty {
        dir: dest_dir.to_path_buf(),
    })?;
    if !single.file_type()?.is_dir() {
        return Err(LayoutError::NotADirectory {
            dir: dest_dir.to_path_buf(),
            name: single.file_name().to_string_lossy().into_owned(),
        }
        .into());
    }
    Ok(single.path())
}
