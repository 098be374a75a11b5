pub mod config;
pub mod error;
pub mod filter;
pub mod progress;

pub use config::{PROGRESS_ENV_VAR, ProgressConfig};
pub use error::{LfsError, Result};
pub use filter::{PathFilter, PathStyle, clean_path, filename_passes_filter};
pub use progress::{CallbackReader, CopyCallback, ProgressLog, copy_with_callback};
