use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::sys::signal::Signal;

/// Logs the error of a `Result` that the caller has decided not to propagate.
macro_rules! log_if_err {
    ($result:expr, $($arg:tt)+) => {
        if let Err(ref e) = $result {
            log::error!("{}: {}", format_args!($($arg)+), e);
        }
    };
}

pub mod unix;

/// Nyush Utility Extensions for `ExitStatus`
pub trait NyushExitStatusExt {
    /// Create an ExitStatus to indicate *successful* program execution.
    fn from_success() -> Self;

    /// Create an ExitStatus from a status code
    fn from_status(code: i32) -> Self;

    /// Create an ExitStatus for a process terminated by `signal`
    fn from_signal(signal: Signal) -> Self;
}

impl NyushExitStatusExt for ExitStatus {
    /// # Examples
    /// ```rust
    /// use nyush::NyushExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_success().success());
    /// ```
    fn from_success() -> Self {
        ExitStatus::from_status(0)
    }

    /// # Examples
    /// ```rust
    /// use nyush::NyushExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert_eq!(ExitStatus::from_status(3).code(), Some(3));
    /// ```
    fn from_status(code: i32) -> Self {
        ExitStatus::from_raw(code << 8)
    }

    fn from_signal(signal: Signal) -> Self {
        ExitStatus::from_raw(signal as i32)
    }
}
