use std::process::ExitCode;

/// Top-level application errors. A concrete type rather than a boxed catch-all so
/// each failure keeps its exit code: fetch pipeline failures exit 1, argument
/// problems exit 2, everything else 3.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("argument error: {0}")]
    ArgValidation(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Fetch(#[from] dep_vendor::Error),
}

impl From<&AppError> for ExitCode {
    fn from(error: &AppError) -> Self {
        ExitCode::from(match error {
            AppError::Fetch(_) => 1u8,
            AppError::ArgValidation(_) => 2,
            AppError::Io(_) => 3,
        })
    }
}
