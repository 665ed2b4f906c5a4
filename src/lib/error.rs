/// The main error enum for this crate.
///
/// Every variant is fatal to the run that produced it: the pipeline makes a single
/// attempt at each step and recovery is always a full re-run. Stamp decoding failures
/// are deliberately absent here; they degrade to "redo the fetch" instead of failing
/// (see [`StampDecodeError`](crate::stamp::StampDecodeError)).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("the SHA256 hash of {path} was {actual} but expected {expected}")]
    HashMismatch {
        path: std::path::PathBuf,
        actual: String,
        expected: String,
    },
    #[error(transparent)]
    Layout(#[from] crate::archive::LayoutError),
    #[error("command '{command}' exited with status {status}\n{stderr}")]
    Subprocess {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}
