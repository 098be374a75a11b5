use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ProgressConfig;
use crate::{LfsError, Result};

/// Append-only progress log for a single file transfer.
///
/// Each line has the form `EVENT INDEX/TOTALFILES WRITTEN/TOTAL FILENAME`.
/// The file is closed when the handle is dropped or passed to [`close`].
///
/// [`close`]: ProgressLog::close
#[derive(Debug)]
pub struct ProgressLog {
    file: File,
    path: PathBuf,
    event: String,
    filename: String,
    index: usize,
    total_files: usize,
    last_logged: u64,
}

impl ProgressLog {
    /// Open the configured progress log for appending.
    ///
    /// Returns `Ok(None)` when logging is disabled: no destination configured,
    /// or an empty `event` or `filename`. A relative destination is rejected
    /// before anything on disk is touched.
    pub fn open(
        config: &ProgressConfig,
        event: &str,
        filename: &str,
        index: usize,
        total_files: usize,
    ) -> Result<Option<Self>> {
        let Some(path) = config.log_path() else {
            return Ok(None);
        };
        if path.as_os_str().is_empty() || event.is_empty() || filename.is_empty() {
            return Ok(None);
        }

        if !path.is_absolute() {
            return Err(LfsError::RelativeLogPath {
                path: path.to_path_buf(),
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LfsError::progress_log(event, path, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LfsError::progress_log(event, path, e))?;

        tracing::debug!(path = %path.display(), event, filename, "opened progress log");

        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
            event: event.to_string(),
            filename: filename.to_string(),
            index,
            total_files,
            last_logged: 0,
        }))
    }

    /// Progress callback body. Appends a line unless `written` is unchanged
    /// since the last line.
    pub fn record(&mut self, total: u64, written: u64, _current: usize) -> Result<()> {
        if written == self.last_logged {
            return Ok(());
        }

        let line = format!(
            "{} {}/{} {}/{} {}\n",
            self.event, self.index, self.total_files, written, total, self.filename
        );
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.sync_data())
            .map_err(|e| LfsError::progress_log(&self.event, &self.path, e))?;
        self.last_logged = written;

        tracing::trace!(event = %self.event, written, total, "logged progress");
        Ok(())
    }

    /// Progress callback that appends to this log, ready to hand to
    /// [`copy_with_callback`](crate::copy_with_callback).
    pub fn callback(&mut self) -> impl FnMut(u64, u64, usize) -> Result<()> + '_ {
        move |total, written, current| self.record(total, written, current)
    }

    /// Flush to disk and release the file.
    pub fn close(self) -> Result<()> {
        self.file
            .sync_all()
            .map_err(|e| LfsError::progress_log(&self.event, &self.path, e))?;
        tracing::debug!(path = %self.path.display(), "closed progress log");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cumulative byte count of the most recent line written
    pub fn last_logged(&self) -> u64 {
        self.last_logged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::copy_with_callback;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn config_in(temp: &TempDir) -> ProgressConfig {
        ProgressConfig::new(temp.path().join("logs").join("progress.log"))
    }

    #[test]
    fn test_disabled_without_destination() {
        let log = ProgressLog::open(&ProgressConfig::default(), "download", "a.bin", 1, 1).unwrap();
        assert!(log.is_none());
    }

    #[test]
    fn test_disabled_without_event_or_filename() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);

        assert!(ProgressLog::open(&config, "", "a.bin", 1, 1).unwrap().is_none());
        assert!(ProgressLog::open(&config, "download", "", 1, 1).unwrap().is_none());
        assert!(!temp.path().join("logs").exists());
    }

    #[test]
    fn test_relative_path_rejected_before_io() {
        let relative = PathBuf::from("lfskit-relative-test").join("progress.log");
        let config = ProgressConfig::new(&relative);

        let err = ProgressLog::open(&config, "upload", "a.bin", 1, 1).unwrap_err();

        assert!(matches!(err, LfsError::RelativeLogPath { ref path } if *path == relative));
        assert!(!relative.exists());
        assert!(!Path::new("lfskit-relative-test").exists());
    }

    #[test]
    fn test_open_creates_directories() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);

        let log = ProgressLog::open(&config, "download", "a.bin", 1, 1)
            .unwrap()
            .unwrap();

        assert!(log.path().exists());
        assert_eq!(log.path(), temp.path().join("logs").join("progress.log"));
        log.close().unwrap();
    }

    #[test]
    fn test_record_formats_line() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let mut log = ProgressLog::open(&config, "download", "path/to/file.bin", 2, 5)
            .unwrap()
            .unwrap();

        log.record(10240, 4096, 4096).unwrap();
        let path = log.path().to_path_buf();
        log.close().unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "download 2/5 4096/10240 path/to/file.bin\n");
    }

    #[test]
    fn test_record_skips_unchanged_total() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let mut log = ProgressLog::open(&config, "checkout", "f", 1, 1)
            .unwrap()
            .unwrap();

        log.record(100, 50, 50).unwrap();
        log.record(100, 50, 0).unwrap();
        log.record(100, 50, 0).unwrap();
        log.record(100, 100, 50).unwrap();
        assert_eq!(log.last_logged(), 100);

        let path = log.path().to_path_buf();
        drop(log);

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "checkout 1/1 50/100 f\ncheckout 1/1 100/100 f\n");
    }

    #[test]
    fn test_zero_written_never_logged() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let mut log = ProgressLog::open(&config, "download", "empty", 1, 1)
            .unwrap()
            .unwrap();

        log.record(0, 0, 0).unwrap();

        let path = log.path().to_path_buf();
        drop(log);
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_appends_to_existing_log() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let path = config.log_path().unwrap().to_path_buf();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "upload 1/1 3/3 old\n").unwrap();

        let mut log = ProgressLog::open(&config, "download", "new", 1, 1)
            .unwrap()
            .unwrap();
        log.record(3, 3, 3).unwrap();
        log.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "upload 1/1 3/3 old\ndownload 1/1 3/3 new\n");
    }

    #[test]
    fn test_copy_with_log_callback() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let mut log = ProgressLog::open(&config, "download", "blob.bin", 1, 2)
            .unwrap()
            .unwrap();

        let data = vec![42u8; 3000];
        let mut out = Vec::new();
        let copied =
            copy_with_callback(&mut out, Cursor::new(&data), 3000, Some(&mut log.callback()))
                .unwrap();
        assert_eq!(copied, 3000);

        let path = log.path().to_path_buf();
        log.close().unwrap();

        let contents = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        // One line per distinct cumulative total; the final EOF read adds none
        assert_eq!(lines.last(), Some(&"download 1/2 3000/3000 blob.bin"));
        assert_eq!(
            lines.len(),
            lines
                .iter()
                .collect::<std::collections::HashSet<_>>()
                .len()
        );
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("logs");
        fs::write(&blocker, "not a directory").unwrap();

        let err = ProgressLog::open(&config_in(&temp), "download", "a.bin", 1, 1).unwrap_err();

        assert!(matches!(err, LfsError::ProgressLog { ref event, .. } if event == "download"));
        assert!(err.to_string().starts_with("Error writing Git LFS download progress to "));
    }

    #[test]
    fn test_callback_writes_chunked_progress() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let mut log = ProgressLog::open(&config, "upload", "a.bin", 3, 4)
            .unwrap()
            .unwrap();

        {
            let mut callback = log.callback();
            callback(10, 4, 4).unwrap();
            callback(10, 4, 0).unwrap();
            callback(10, 10, 6).unwrap();
        }

        let path = log.path().to_path_buf();
        log.close().unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "upload 3/4 4/10 a.bin\nupload 3/4 10/10 a.bin\n"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_aborts_copy() {
        let config = ProgressConfig::new("/dev/full");
        let mut log = ProgressLog::open(&config, "download", "a.bin", 1, 1)
            .unwrap()
            .unwrap();

        let mut out = Vec::new();
        let err = copy_with_callback(
            &mut out,
            Cursor::new(vec![0u8; 100]),
            100,
            Some(&mut log.callback()),
        )
        .unwrap_err();

        match err {
            LfsError::ProgressLog {
                ref event,
                ref path,
                ref source,
            } => {
                assert_eq!(event, "download");
                assert_eq!(path, Path::new("/dev/full"));
                assert_eq!(source.raw_os_error(), Some(28));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(
            err.to_string()
                .starts_with("Error writing Git LFS download progress to /dev/full: ")
        );
        assert_eq!(log.last_logged(), 0);
        assert!(out.is_empty());
    }
}
