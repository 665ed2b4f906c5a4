//! Fetch one versioned third-party source archive, verify it, unpack it into a
//! normalized layout, patch it, and stamp the result so identical re-runs are no-ops.
//!
//! This crate is the vendoring step of a build pipeline: it materializes an external
//! source tree reproducibly and idempotently, tolerating interrupted runs and partial
//! downloads without ever corrupting the destination tree.
//!
//! # Pipeline
//!
//! A [`Downloader`] runs one [`FetchSpec`] start to finish:
//!
//! 1. If the destination's stamp file records the same package name and version,
//!    return immediately with no network access and no writes.
//! 2. Otherwise delete the destination tree and start from a clean slate.
//! 3. Download the archive, streaming into a staged file that becomes visible at its
//!    cache path only once fully written ([`StagedFile`]); a previously cached
//!    archive skips the network entirely.
//! 4. Verify the archive's SHA-256 against the expected digest.
//! 5. Extract, then hoist the archive's single wrapping directory so the sources sit
//!    directly in the destination.
//! 6. Apply the configured patches in order with an external `patch` executable.
//! 7. Write a fresh stamp.
//!
//! Every failure is fatal to the run and leaves no stamp behind, so the next
//! invocation redoes the work from scratch. There are no retries and no partial
//! recovery anywhere.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use dep_vendor::{Downloader, FetchSpec};
//!
//! # fn main() -> Result<(), dep_vendor::Error> {
//! let spec = FetchSpec {
//!     package_name: "googletest".to_owned(),
//!     package_version: "1.14.0".to_owned(),
//!     download_url: "https://example.com/googletest-1.14.0.zip".to_owned(),
//!     expected_sha256: "8ad598c73ad796e0d8280b082cebd82a630d73e73cd3c70057938a6501bba5d7"
//!         .to_owned(),
//!     dest_dir: PathBuf::from("third_party/googletest"),
//!     cache_dir: Some(PathBuf::from("/var/cache/dep-vendor")),
//!     patch_executable: None,
//!     patches: Vec::new(),
//! };
//! Downloader::new(spec).run()?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod digest;
mod download;
mod error;
pub mod patch;
pub mod stamp;
pub mod store;

#[doc(inline)]
pub use crate::archive::LayoutError;
#[doc(inline)]
pub use crate::download::{Downloader, FetchSpec, STAMP_FILE_NAME};
#[doc(inline)]
pub use crate::error::Error;
#[doc(inline)]
pub use crate::patch::Patch;
#[doc(inline)]
pub use crate::stamp::{Stamp, StampDecodeError};
#[doc(inline)]
pub use crate::store::{Committed, StagedFile};
