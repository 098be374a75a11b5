use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LfsError {
    #[error("{} must be an absolute path: {}", crate::config::PROGRESS_ENV_VAR, .path.display())]
    RelativeLogPath { path: PathBuf },

    #[error("Error writing Git LFS {} progress to {}: {}", .event, .path.display(), .source)]
    ProgressLog {
        event: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Returned by a caller's progress callback to cancel the copy it observes
    #[error("Copy aborted: {0}")]
    Aborted(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl LfsError {
    pub(crate) fn progress_log(event: &str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ProgressLog {
            event: event.to_string(),
            path: path.into(),
            source,
        }
    }

    /// Recover an error that travelled through `io::Read` as an `io::Error`.
    ///
    /// Callback failures are boxed into an `io::Error` by `CallbackReader`;
    /// this unboxes them so callers get back the callback's own error.
    pub(crate) fn from_read(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<LfsError>()) {
            return Self::Io(err);
        }

        match err.into_inner().map(|inner| inner.downcast::<LfsError>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(inner)) => Self::Io(io::Error::other(inner)),
            None => Self::Io(io::Error::other("progress callback failed")),
        }
    }
}

pub type Result<T> = std::result::Result<T, LfsError>;
