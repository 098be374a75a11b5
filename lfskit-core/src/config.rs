use std::path::{Path, PathBuf};

/// Environment variable the CLI reads the progress log destination from
pub const PROGRESS_ENV_VAR: &str = "GIT_LFS_PROGRESS";

/// Progress logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Destination of the progress log (None = logging disabled)
    pub log_path: Option<PathBuf>,
}

impl ProgressConfig {
    /// Build a config from a destination path. An empty path disables logging.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        let log_path = log_path.into();
        Self {
            log_path: (!log_path.as_os_str().is_empty()).then_some(log_path),
        }
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.log_path.is_some()
    }
}
