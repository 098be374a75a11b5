mod log;
mod reader;

pub use log::ProgressLog;
pub use reader::{CallbackReader, CopyCallback, copy_with_callback};
