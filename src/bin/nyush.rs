use std::path::PathBuf;
use std::process;

use atty::Stream;
use docopt::Docopt;
use log::{debug, error, LevelFilter};
use nix::unistd::Pid;
use serde_derive::Deserialize;

use nyush::errors::Result;
use nyush::{create_shell, Editor, ShellConfig};

const LOG_FILE_NAME: &str = ".nyush_log";

const USAGE: &str = "
nyush.

Usage:
    nyush [options]
    nyush (-h | --help)
    nyush --version

Options:
    -h --help            Show this screen.
    --version            Show version.
    --log=<path>         File to write log to, defaults to ~/.nyush_log
    --log-level=<level>  One of off, error, warn, info, debug or trace [default: debug].
    --max-jobs=<n>       Number of suspended jobs to keep track of [default: 100].
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    flag_version: bool,
    flag_log: Option<String>,
    flag_log_level: String,
    flag_max_jobs: usize,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if args.flag_version {
        println!("nyush version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let level = args.flag_log_level.parse().unwrap_or_else(|_| {
        eprintln!(
            "nyush: unknown log level '{}', using debug",
            args.flag_log_level
        );
        LevelFilter::Debug
    });
    init_logger(&args.flag_log, level);
    debug!("{:?}", args);

    let interactive = atty::is(Stream::Stdin);
    let shell_config = if interactive {
        ShellConfig::interactive()
    } else {
        ShellConfig::noninteractive()
    }
    .with_job_capacity(args.flag_max_jobs);

    if let Err(e) = execute_from_stdin(shell_config, interactive) {
        error!("nyush exited with error: {:?}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn execute_from_stdin(shell_config: ShellConfig, interactive: bool) -> Result<()> {
    let mut shell = create_shell(shell_config)?;
    let mut editor = Editor::new(interactive);
    shell.execute_from_stdin(&mut editor)
}

/// Logging is best effort: if the log file cannot be opened the shell runs
/// without it.
fn init_logger(path: &Option<String>, level: LevelFilter) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => {
            eprintln!("nyush: unable to get home directory, logging disabled");
            return;
        }
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!(
                "nyush: failed to open log file {}: {}",
                log_path.display(),
                e
            );
            return;
        }
    };

    let pid = Pid::this();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("nyush: failed to initialize logging: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}
