use std::path::PathBuf;

use clap::Parser;

use dep_vendor::{FetchSpec, Patch};

use crate::error::AppError;

#[derive(Debug, Parser)]
#[command(name = "dep-vendor")]
#[command(about = "Fetch, verify and unpack a third-party source archive")]
#[command(version)]
#[command(term_width = 80)]
struct Args {
    /// Name of the package being vendored.
    package_name: String,

    /// Version of the package being vendored.
    package_version: String,

    /// URL of the zip archive to download.
    download_url: String,

    /// Expected SHA-256 of the downloaded archive, as a hex string.
    sha256: String,

    /// Directory the unpacked source tree ends up in.
    dest_dir: PathBuf,

    /// Directory into which downloaded archives are cached. If omitted, check the
    /// `DEP_VENDOR_CACHE` environment variable and then the user cache directory.
    #[arg(long, value_name = "PATH")]
    cache_dir: Option<PathBuf>,

    /// Do not keep the downloaded archive in a cache directory.
    #[arg(long)]
    no_cache: bool,

    /// The path of the `patch` executable to use to apply source patches.
    #[arg(long, value_name = "PATH")]
    patch_executable: Option<PathBuf>,

    /// A patch file to apply to the unpacked source tree. May be specified zero or
    /// many times; patches are applied in the order given. Requires
    /// --patch-executable.
    #[arg(long = "patch", value_name = "PATH", requires = "patch_executable")]
    patches: Vec<PathBuf>,
}

/// Parse and validate the command line into a ready-to-run fetch specification.
/// Patch files are read and digested here, so a missing or unreadable patch is an
/// argument error rather than a mid-pipeline failure.
pub fn parse() -> Result<FetchSpec, AppError> {
    Args::parse().into_spec()
}

impl Args {
    fn into_spec(self) -> Result<FetchSpec, AppError> {
        let cache_dir = if self.no_cache {
            None
        } else {
            Some(detect_cache_dir(self.cache_dir)?)
        };

        let mut patches = Vec::with_capacity(self.patches.len());
        for path in self.patches {
            let patch = Patch::from_file(path.clone()).map_err(|err| {
                AppError::ArgValidation(format!(
                    "unable to read patch file {}: {err}",
                    path.display()
                ))
            })?;
            patches.push(patch);
        }

        Ok(FetchSpec {
            package_name: self.package_name,
            package_version: self.package_version,
            download_url: self.download_url,
            expected_sha256: self.sha256,
            dest_dir: self.dest_dir,
            cache_dir,
            patch_executable: self.patch_executable,
            patches,
        })
    }
}

/// Detect the cache directory, falling back to `DEP_VENDOR_CACHE` and then the
/// per-user cache directory.
fn detect_cache_dir(arg: Option<PathBuf>) -> Result<PathBuf, AppError> {
    match arg {
        Some(dir) => Ok(dir),
        None => match std::env::var_os("DEP_VENDOR_CACHE") {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => {
                let project_dirs = directories::ProjectDirs::from("", "", "dep-vendor")
                    .ok_or_else(|| {
                        AppError::ArgValidation(
                            "could not determine cache directory".to_owned(),
                        )
                    })?;
                Ok(project_dirs.cache_dir().to_path_buf())
            }
        },
    }
}
