use nix::sys::signal::{self, SigHandler, Signal};

/// Signals the terminal sends to every process in its foreground process
/// group. Jobs share the shell's process group, so the shell ignores these
/// while its children keep the default disposition.
pub const TERMINAL_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTSTP];

/// Sets the disposition of every terminal signal to `handler`.
///
/// Async-signal-safe: this runs in forked children before `exec`.
pub fn set_terminal_signal_handlers(handler: SigHandler) -> nix::Result<()> {
    for &terminal_signal in &TERMINAL_SIGNALS {
        // signal(3) only fails for invalid signal numbers or for SIGKILL and
        // SIGSTOP, neither of which are in TERMINAL_SIGNALS.
        unsafe { signal::signal(terminal_signal, handler) }?;
    }

    Ok(())
}
