//! Applying source patches with an external `patch` executable.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::digest;
use super::error::Error;

/// A patch file together with the digest of its contents at the time the run was
/// configured. The digest is never re-read: it records the patch as it was when the
/// fetch was specified, so a later edit shows up as a changed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub path: PathBuf,
    pub sha256: String,
}

impl Patch {
    /// Read the patch file and record the digest of its current contents.
    pub fn from_file(path: PathBuf) -> io::Result<Self> {
        let sha256 = digest::hex_digest_of_file(&path)?;
        Ok(Self { path, sha256 })
    }
}

/// Apply `patches` in the given order inside `working_dir`. Order is caller-controlled
/// and significant; nothing is sorted or deduplicated. The first patch whose subprocess
/// exits non-zero aborts the remaining sequence. The tree is left partially patched;
/// the caller's next run starts from a clean wipe. An empty list is a no-op.
pub fn apply_all(patches: &[Patch], executable: &Path, working_dir: &Path) -> Result<(), Error> {
    for patch in patches {
        apply_one(patch, executable, working_dir)?;
    }
    Ok(())
}

fn apply_one(patch: &Patch, executable: &Path, working_dir: &Path) -> Result<(), Error> {
    tracing::info!("applying patch: {}", patch.path.display());
    let patch_file = patch.path.canonicalize()?;

    let mut command = Command::new(executable);
    command
        .arg("-p1")
        .arg("-i")
        .arg(&patch_file)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let command_line = format!(
        "{} -p1 -i {}",
        executable.display(),
        patch_file.display()
    );
    tracing::info!(
        "running command {command_line} (in directory {})",
        working_dir.display()
    );

    let output = command.output()?;
    if !output.status.success() {
        return Err(Error::Subprocess {
            command: command_line,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}
