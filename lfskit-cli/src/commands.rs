use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail};
use jwalk::WalkDir;
use lfskit_core::{PathFilter, ProgressConfig, ProgressLog, copy_with_callback};

/// A file picked for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Location on disk
    pub path: PathBuf,
    /// Path relative to the walk root with `/` separators, as git reports it
    pub name: String,
}

/// Totals for a finished copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub files: usize,
    pub bytes: u64,
}

/// Walk `root` and return the files `filter` admits, sorted by name
pub fn collect_files(root: &Path, filter: &PathFilter) -> Result<Vec<Candidate>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).skip_hidden(false).sort(true) {
        let entry = entry.wrap_err_with(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = repo_path(relative);

        if filter.admit(&name) {
            files.push(Candidate { path, name });
        } else {
            tracing::debug!(name, "skipped by filter");
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Copy `source` (a file or a directory tree) to `destination`, logging
/// per-file progress when `config` names a log file.
pub fn copy(
    source: &Path,
    destination: &Path,
    event: &str,
    config: &ProgressConfig,
    filter: &PathFilter,
) -> Result<CopySummary> {
    if !source.exists() {
        bail!("Path does not exist: {}", source.display());
    }

    let jobs: Vec<(Candidate, PathBuf)> = if source.is_file() {
        let name = source
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| source.to_string_lossy().to_string());
        let target = if destination.is_dir() {
            destination.join(&name)
        } else {
            destination.to_path_buf()
        };

        if filter.admit(&name) {
            let candidate = Candidate {
                path: source.to_path_buf(),
                name,
            };
            vec![(candidate, target)]
        } else {
            Vec::new()
        }
    } else {
        collect_files(source, filter)?
            .into_iter()
            .map(|candidate| {
                let target = destination.join(&candidate.name);
                (candidate, target)
            })
            .collect()
    };

    let total_files = jobs.len();
    let mut summary = CopySummary::default();

    for (i, (candidate, target)) in jobs.iter().enumerate() {
        let copied = copy_file(candidate, target, event, i + 1, total_files, config)
            .wrap_err_with(|| format!("Failed to copy {}", candidate.name))?;
        summary.files += 1;
        summary.bytes += copied;
    }

    tracing::info!(
        files = summary.files,
        bytes = summary.bytes,
        "copy complete"
    );
    Ok(summary)
}

fn copy_file(
    candidate: &Candidate,
    target: &Path,
    event: &str,
    index: usize,
    total_files: usize,
    config: &ProgressConfig,
) -> Result<u64> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let reader = File::open(&candidate.path)
        .wrap_err_with(|| format!("Failed to open {}", candidate.path.display()))?;
    let size = reader.metadata()?.len();
    let mut writer = File::create(target)
        .wrap_err_with(|| format!("Failed to create {}", target.display()))?;

    tracing::debug!(name = %candidate.name, size, index, total_files, "copying");

    // The log is closed when it goes out of scope, including on error.
    let copied = match ProgressLog::open(config, event, &candidate.name, index, total_files)? {
        Some(mut log) => {
            let copied = copy_with_callback(&mut writer, reader, size, Some(&mut log.callback()))?;
            log.close()?;
            copied
        }
        None => copy_with_callback(&mut writer, reader, size, None)?,
    };

    Ok(copied)
}

/// Join the components of a relative path with `/`
fn repo_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
