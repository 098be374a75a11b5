mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use lfskit_core::{PROGRESS_ENV_VAR, PathFilter, PathStyle, ProgressConfig};

/// lfskit - progress-logged copies and include/exclude path filtering
#[derive(Parser, Debug)]
#[command(name = "lfskit")]
#[command(about = "Progress-logged copies and include/exclude path filtering for large files")]
#[command(version)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy a file or directory tree, appending progress lines to a log
    Copy {
        /// File or directory to copy
        source: PathBuf,

        /// Destination file or directory
        destination: PathBuf,

        /// Event label written at the start of each progress line
        #[arg(short, long, default_value = "download")]
        event: String,

        /// Absolute path of the progress log (empty disables logging)
        #[arg(long, env = PROGRESS_ENV_VAR)]
        progress_log: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List the files under a directory that pass the include/exclude filter
    Filter {
        /// Directory to walk (defaults to current directory)
        #[arg(default_value = ".")]
        root: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Only process paths matching this pattern (repeatable)
    #[arg(short = 'I', long = "include", value_name = "PATTERN")]
    includes: Vec<String>,

    /// Skip paths matching this pattern (repeatable)
    #[arg(short = 'X', long = "exclude", value_name = "PATTERN")]
    excludes: Vec<String>,

    /// Path convention for cleaning and directory-prefix matching
    #[arg(long, value_enum, default_value_t = StyleArg::Native)]
    path_style: StyleArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StyleArg {
    Native,
    Unix,
    Windows,
}

impl FilterArgs {
    fn to_filter(&self) -> PathFilter {
        let style = match self.path_style {
            StyleArg::Native => PathStyle::native(),
            StyleArg::Unix => PathStyle::Unix,
            StyleArg::Windows => PathStyle::Windows,
        };
        PathFilter::new(self.includes.iter().cloned(), self.excludes.iter().cloned())
            .with_style(style)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    logging::init(args.verbose)?;

    match args.command {
        Command::Copy {
            source,
            destination,
            event,
            progress_log,
            filter,
        } => {
            let config = progress_log.map(ProgressConfig::new).unwrap_or_default();
            let summary = commands::copy(
                &source,
                &destination,
                &event,
                &config,
                &filter.to_filter(),
            )?;
            println!(
                "Copied {} file(s), {} bytes",
                summary.files, summary.bytes
            );
        }
        Command::Filter { root, filter } => {
            if !root.is_dir() {
                eprintln!("Error: Path is not a directory: {}", root.display());
                std::process::exit(1);
            }
            for candidate in commands::collect_files(&root, &filter.to_filter())? {
                println!("{}", candidate.name);
            }
        }
    }

    Ok(())
}
