//! Launching external commands.
//!
//! The shell never touches `fork`/`exec` directly: it asks a [`Spawner`] for
//! [`Process`] handles and drives them through `wait` and `signal`. The
//! [`OsSpawner`] backs those handles with real child processes.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::process::{self, Child, ChildStdout, ExitStatus};

use failure::{Fail, ResultExt};
use log::{debug, error, warn};
use nix::{
    errno::Errno,
    libc,
    sys::{
        signal::{self, SigHandler, Signal},
        wait::{self, WaitPidFlag, WaitStatus},
    },
    unistd::Pid,
};

use crate::{
    core::intermediate_representation as ir,
    errors::{Error, ErrorKind, Result},
    util::{unix, NyushExitStatusExt},
};

/// Permission bits for files created by output redirection.
const CREATED_FILE_MODE: u32 = 0o644;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProcessId(u32);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessStatus {
    Running,
    Stopped,
    /// Exited or terminated by a signal.
    Completed,
}

/// A handle to a launched process.
pub trait Process {
    fn id(&self) -> ProcessId;
    fn argv(&self) -> String;
    fn status(&self) -> ProcessStatus;
    fn status_code(&self) -> Option<ExitStatus>;
    /// Blocks until the process stops, exits, or is terminated by a signal.
    fn wait(&mut self) -> Result<ProcessStatus>;
    /// Returns the new status if the process changed state, without blocking.
    fn try_wait(&mut self) -> Result<Option<ProcessStatus>>;
    fn signal(&mut self, signal: Signal) -> Result<()>;

    fn is_terminated(&self) -> bool {
        self.status() == ProcessStatus::Completed
    }
}

impl fmt::Debug for dyn Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process {{ id: {}, argv: {} }}", self.id(), self.argv())
    }
}

/// Creates the processes for one command line.
pub trait Spawner {
    /// Launches every stage of `stages`, connecting pipes and applying file
    /// redirects. Either all stages are running when this returns, or none
    /// are left behind.
    fn spawn(&mut self, stages: &[ir::SimpleCommand]) -> Result<Vec<Box<dyn Process>>>;
}

#[derive(Debug)]
enum Stdin {
    Inherit,
    /// The left side of the pipeline sends its output elsewhere.
    Null,
    File(File),
    Child(ChildStdout),
}

#[derive(Debug)]
enum Output {
    Inherit,
    File(File),
    CreatePipe,
}

impl Stdin {
    fn new(redirect: &ir::Stdio, pipe: Option<ChildStdout>) -> Result<Self> {
        match (redirect, pipe) {
            (ir::Stdio::Filename(filename), _) | (ir::Stdio::AppendFilename(filename), _) => {
                Ok(Stdin::File(open_stdin(filename)?))
            }
            (ir::Stdio::Pipe, Some(stdout)) => Ok(Stdin::Child(stdout)),
            (ir::Stdio::Pipe, None) => Ok(Stdin::Null),
            (ir::Stdio::Inherit, _) => Ok(Stdin::Inherit),
        }
    }
}

impl Output {
    fn new(redirect: &ir::Stdio) -> Result<Self> {
        match redirect {
            ir::Stdio::Filename(filename) => Ok(Output::File(open_stdout(filename, false)?)),
            ir::Stdio::AppendFilename(filename) => Ok(Output::File(open_stdout(filename, true)?)),
            ir::Stdio::Pipe => Ok(Output::CreatePipe),
            ir::Stdio::Inherit => Ok(Output::Inherit),
        }
    }
}

impl From<Stdin> for process::Stdio {
    fn from(stdin: Stdin) -> Self {
        match stdin {
            Stdin::Inherit => Self::inherit(),
            Stdin::Null => Self::null(),
            Stdin::File(file) => file.into(),
            Stdin::Child(child) => child.into(),
        }
    }
}

impl From<Output> for process::Stdio {
    fn from(stdout: Output) -> Self {
        match stdout {
            Output::Inherit => Self::inherit(),
            Output::File(file) => file.into(),
            Output::CreatePipe => Self::piped(),
        }
    }
}

/// Opens `filename` read-only for input redirection.
pub fn open_stdin(filename: &str) -> Result<File> {
    let file = File::open(filename).context(ErrorKind::InvalidFile)?;
    Ok(file)
}

/// Opens `filename` for output redirection, creating it if needed.
pub fn open_stdout(filename: &str, append: bool) -> Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(!append)
        .append(append)
        .mode(CREATED_FILE_MODE)
        .open(filename)
        .context(ErrorKind::InvalidFile)?;
    Ok(file)
}

/// Launches real child processes.
#[derive(Debug, Default)]
pub struct OsSpawner {
    /// Reset terminal signals to their default disposition in children,
    /// undoing the shell ignoring them.
    restore_signals: bool,
}

impl OsSpawner {
    pub fn new(restore_signals: bool) -> Self {
        Self { restore_signals }
    }

    fn spawn_stage(
        &self,
        stage: &ir::SimpleCommand,
        pipe: Option<ChildStdout>,
    ) -> Result<ExternalProcess> {
        let stdin = Stdin::new(&stage.stdin, pipe)?;
        let stdout = Output::new(&stage.stdout)?;

        // Every descriptor opened above is close-on-exec; only the copies
        // made onto stdin and stdout reach the program. They are closed in
        // the parent when `command` is dropped.
        let mut command = process::Command::new(&stage.program);
        command.args(&stage.args);
        command.stdin(stdin);
        command.stdout(stdout);
        if self.restore_signals {
            unsafe {
                command.pre_exec(restore_default_signals);
            }
        }

        let child = command
            .spawn()
            .map_err(|e| spawn_error(&stage.program, e))?;
        debug!("spawned '{}' as {}", stage.argv(), child.id());
        Ok(ExternalProcess::new(stage, child))
    }
}

impl Spawner for OsSpawner {
    fn spawn(&mut self, stages: &[ir::SimpleCommand]) -> Result<Vec<Box<dyn Process>>> {
        let mut processes: Vec<Box<dyn Process>> = Vec::with_capacity(stages.len());
        let mut pipe = None;
        for stage in stages {
            match self.spawn_stage(stage, pipe.take()) {
                Ok(mut process) => {
                    pipe = process.child.stdout.take();
                    processes.push(Box::new(process));
                }
                Err(e) => {
                    abandon(processes);
                    return Err(e);
                }
            }
        }

        Ok(processes)
    }
}

/// Kills and reaps the earlier stages of a pipeline whose later stage failed
/// to launch.
fn abandon(processes: Vec<Box<dyn Process>>) {
    for mut process in processes {
        warn!("killing {:?}, its pipeline failed to launch", process);
        let temp_result = process.signal(Signal::SIGKILL);
        log_if_err!(temp_result, "failed to kill {}", process.id());
        let temp_result = process.wait();
        log_if_err!(temp_result, "failed to reap {}", process.id());
    }
}

fn restore_default_signals() -> io::Result<()> {
    unix::set_terminal_signal_handlers(SigHandler::SigDfl)?;
    Ok(())
}

/// `Command::spawn` reports both fork and exec failures; only resource
/// exhaustion comes from fork.
fn spawn_error(program: &str, e: io::Error) -> Error {
    match e.raw_os_error() {
        Some(libc::EAGAIN) | Some(libc::ENOMEM) => {
            error!("failed to fork for '{}': {}", program, e);
            e.context(ErrorKind::ForkFailed).into()
        }
        _ => {
            debug!("failed to execute '{}': {}", program, e);
            e.context(ErrorKind::ExecFailed).into()
        }
    }
}

#[derive(Debug)]
struct ExternalProcess {
    argv: String,
    child: Child,
    status: ProcessStatus,
    status_code: Option<ExitStatus>,
}

impl ExternalProcess {
    fn new(stage: &ir::SimpleCommand, child: Child) -> Self {
        Self {
            argv: stage.argv(),
            child,
            status: ProcessStatus::Running,
            status_code: None,
        }
    }

    fn pid(&self) -> Pid {
        self.id().into()
    }

    fn waitpid(&mut self, flags: WaitPidFlag) -> Result<Option<ProcessStatus>> {
        if self.is_terminated() {
            return Ok(Some(self.status));
        }

        loop {
            match wait::waitpid(self.pid(), Some(flags)) {
                Ok(WaitStatus::StillAlive) => return Ok(None),
                Ok(wait_status) => {
                    if let Some(status) = self.mark_process_status(wait_status) {
                        return Ok(Some(status));
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.context(ErrorKind::Nix).into()),
            }
        }
    }

    fn mark_process_status(&mut self, wait_status: WaitStatus) -> Option<ProcessStatus> {
        match wait_status {
            WaitStatus::Exited(pid, status_code) => {
                debug!("{} exited with {}.", pid, status_code);
                self.status = ProcessStatus::Completed;
                self.status_code = Some(ExitStatus::from_status(status_code));
            }
            WaitStatus::Signaled(pid, signal, ..) => {
                debug!("{} terminated by signal {:?}.", pid, signal);
                self.status = ProcessStatus::Completed;
                self.status_code = Some(ExitStatus::from_signal(signal));
            }
            WaitStatus::Stopped(pid, signal) => {
                debug!("{} was signaled to stop {:?}.", pid, signal);
                self.status = ProcessStatus::Stopped;
            }
            WaitStatus::Continued(pid) => {
                debug!("{} continued.", pid);
                self.status = ProcessStatus::Running;
            }
            _ => return None,
        }

        Some(self.status)
    }
}

impl Process for ExternalProcess {
    fn id(&self) -> ProcessId {
        self.child.id().into()
    }

    fn argv(&self) -> String {
        self.argv.clone()
    }

    fn status(&self) -> ProcessStatus {
        self.status
    }

    fn status_code(&self) -> Option<ExitStatus> {
        self.status_code
    }

    fn wait(&mut self) -> Result<ProcessStatus> {
        loop {
            if let Some(status) = self.waitpid(WaitPidFlag::WUNTRACED)? {
                return Ok(status);
            }
        }
    }

    fn try_wait(&mut self) -> Result<Option<ProcessStatus>> {
        self.waitpid(WaitPidFlag::WUNTRACED | WaitPidFlag::WNOHANG)
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        if self.is_terminated() {
            // The pid may already belong to another process.
            return Ok(());
        }

        signal::kill(self.pid(), signal).context(ErrorKind::Nix)?;
        if signal == Signal::SIGCONT {
            self.status = ProcessStatus::Running;
        }
        Ok(())
    }
}

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self {
        ProcessId(value)
    }
}

impl From<ProcessId> for Pid {
    fn from(value: ProcessId) -> Self {
        Pid::from_raw(value.0 as libc::pid_t)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProcessStatus::Running => write!(f, "Running"),
            ProcessStatus::Stopped => write!(f, "Stopped"),
            ProcessStatus::Completed => write!(f, "Completed"),
        }
    }
}
