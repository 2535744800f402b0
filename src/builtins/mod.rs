//! Nyush builtins
//!
//! Commands the shell runs itself rather than launching a program. Each one
//! validates its arguments against a docopt usage string.

use std::iter;

use docopt::Docopt;
use log::debug;
use serde::Deserialize;

use self::prelude::*;

use self::dirs::Cd;
use self::exit::Exit;
use self::jobs::{Fg, Jobs};

pub mod prelude {
    pub use std::io::Write;

    pub use failure::ResultExt;

    pub use super::parse_args;
    pub use crate::errors::{Error, ErrorKind, Result};
    pub use crate::shell::Shell;
}

mod dirs;
mod exit;
mod jobs;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const FG_NAME: &str = "fg";
const JOBS_NAME: &str = "jobs";

/// Represents a Nyush builtin command such as cd or jobs.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The docopt usage string the arguments must match.
    const HELP: &'static str;
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, EXIT_NAME, FG_NAME, JOBS_NAME].contains(&program.as_ref())
}

/// precondition: command is a builtin.
pub fn run<S1, S2>(shell: &mut Shell, program: S1, args: &[S2], stdout: &mut dyn Write) -> Result<()>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    debug_assert!(is_builtin(&program));

    match program.as_ref() {
        CD_NAME => Cd::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        FG_NAME => Fg::run(shell, args, stdout),
        JOBS_NAME => Jobs::run(shell, args, stdout),
        _ => unreachable!(),
    }
}

/// Matches `program` and `args` against `usage`. Arguments that do not fit
/// the usage are an invalid command.
pub fn parse_args<'de, D, S, I>(usage: &str, program: S, args: I) -> Result<D>
where
    D: Deserialize<'de>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let docopt = Docopt::new(usage).context(ErrorKind::Docopt)?;
    docopt
        .help(false)
        .argv(iter::once(program).chain(args))
        .deserialize()
        .map_err(|e| {
            debug!("builtin arguments rejected: {}", e);
            Error::invalid_command()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_builtin() {
        for name in &["cd", "exit", "fg", "jobs"] {
            assert!(is_builtin(name));
        }
        for name in &["ls", "bg", "kill", "history", "CD", ""] {
            assert!(!is_builtin(name));
        }
    }
}
