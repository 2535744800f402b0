use failure::ResultExt;
use log::{error, info};
use nix::sys::signal::SigHandler;

use super::{Shell, ShellConfig};
use crate::{
    errors::{ErrorKind, Result},
    execute_command::OsSpawner,
    util::unix,
};

/// Creates a shell that launches real processes.
pub fn create_shell(config: ShellConfig) -> Result<Shell> {
    let mut restore_signals = false;
    if config.ignore_terminal_signals() {
        match initialize_job_control() {
            Ok(()) => restore_signals = true,
            Err(e) => error!("failed to initialize shell for job control: {}", e),
        }
    }

    let shell = Shell::new(config, Box::new(OsSpawner::new(restore_signals)));
    info!("nyush started up");
    Ok(shell)
}

/// The shell and its jobs share one process group, so the shell ignores the
/// signals the terminal sends that group; children restore the defaults
/// before `exec`.
fn initialize_job_control() -> Result<()> {
    unix::set_terminal_signal_handlers(SigHandler::SigIgn).context(ErrorKind::Nix)?;
    Ok(())
}
