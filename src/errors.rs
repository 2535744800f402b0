//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    pub(crate) fn invalid_command() -> Error {
        Error::from(ErrorKind::InvalidCommand)
    }

    pub(crate) fn invalid_job() -> Error {
        Error::from(ErrorKind::InvalidJob)
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ctx.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed builtin arity or command syntax.
    InvalidCommand,
    /// `cd` target does not exist or cannot be entered.
    InvalidDirectory,
    /// `fg` index is out of range or the job is not suspended.
    InvalidJob,
    /// `exit` refused because suspended jobs remain.
    PendingJobs,
    /// A redirection target could not be opened.
    InvalidFile,
    /// The program could not be located or executed.
    ExecFailed,
    /// The process could not be created.
    ForkFailed,
    /// Every job table slot is in use.
    JobTableFull,
    Docopt,
    Io,
    Nix,
    Readline,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::InvalidCommand => write!(f, "invalid command"),
            ErrorKind::InvalidDirectory => write!(f, "invalid directory"),
            ErrorKind::InvalidJob => write!(f, "invalid job"),
            ErrorKind::PendingJobs => write!(f, "there are suspended jobs"),
            ErrorKind::InvalidFile => write!(f, "invalid file"),
            ErrorKind::ExecFailed => write!(f, "invalid program"),
            ErrorKind::ForkFailed => write!(f, "failed to create process"),
            ErrorKind::JobTableFull => write!(f, "too many suspended jobs"),
            ErrorKind::Docopt => write!(f, "Docopt error occurred"),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Nix => write!(f, "Nix error occurred"),
            ErrorKind::Readline => write!(f, "Readline error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}
