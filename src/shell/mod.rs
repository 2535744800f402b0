//! The shell loop: read a line, run it, report any error, repeat.
//!
//! A `Shell` owns the job table and a [`Spawner`]. Foreground commands are
//! waited on until they exit; one that stops instead is recorded in the job
//! table and the prompt comes back.

use std::fmt;
use std::io::{self, Write};

use failure::ResultExt;
use log::{debug, info, warn};
use nix::sys::signal::Signal;

use crate::{
    builtins,
    core::{
        intermediate_representation as ir,
        job::{JobId, JobTable},
        parser,
    },
    editor::{self, Editor},
    errors::{Error, ErrorKind, Result},
    execute_command::{open_stdin, open_stdout, Process, ProcessStatus, Spawner},
};

pub use self::unix::create_shell;

pub mod unix;

/// Number of suspended jobs a shell can record.
pub const DEFAULT_JOB_CAPACITY: usize = 100;

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Number of slots in the job table.
    job_capacity: usize,

    /// Determines if the shell ignores SIGINT, SIGQUIT and SIGTSTP so that
    /// only its children receive them from the terminal.
    ignore_terminal_signals: bool,
}

impl ShellConfig {
    /// Creates a shell attached to a terminal.
    pub fn interactive() -> Self {
        Self {
            ignore_terminal_signals: true,
            ..Default::default()
        }
    }

    /// Creates a shell reading commands from a pipe or file. Terminal signals
    /// keep their default disposition.
    pub fn noninteractive() -> Self {
        Default::default()
    }

    pub fn with_job_capacity(self, job_capacity: usize) -> Self {
        Self {
            job_capacity,
            ..self
        }
    }

    pub fn job_capacity(&self) -> usize {
        self.job_capacity
    }

    pub fn ignore_terminal_signals(&self) -> bool {
        self.ignore_terminal_signals
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            job_capacity: DEFAULT_JOB_CAPACITY,
            ignore_terminal_signals: false,
        }
    }
}

pub struct Shell {
    job_table: JobTable,
    spawner: Box<dyn Spawner>,
    config: ShellConfig,
    /// Set by the `exit` builtin; the loop stops after the current line.
    exit_requested: bool,
}

impl Shell {
    pub fn new(config: ShellConfig, spawner: Box<dyn Spawner>) -> Self {
        Self {
            job_table: JobTable::with_capacity(config.job_capacity()),
            spawner,
            config,
            exit_requested: false,
        }
    }

    /// Runs commands read from `editor` until end of input or `exit`.
    ///
    /// Errors from individual commands are reported and the loop continues;
    /// only a failure to read input is returned.
    pub fn execute_from_stdin(&mut self, editor: &mut Editor) -> Result<()> {
        loop {
            self.job_table.reap();

            let line = match editor.readline(&editor::prompt())? {
                Some(line) => line,
                None => {
                    println!();
                    break;
                }
            };

            let temp_result = self.execute_command_string(&line, &mut io::stdout());
            if let Err(ref e) = temp_result {
                report(e);
            }

            if self.exit_requested {
                break;
            }
        }

        info!("nyush has shut down");
        Ok(())
    }

    /// Parses and runs one command line. Builtin output goes to `stdout`
    /// unless redirected.
    pub fn execute_command_string(&mut self, input: &str, stdout: &mut dyn Write) -> Result<()> {
        let command = match parser::Command::parse(input)? {
            Some(command) => command,
            None => return Ok(()),
        };

        let command_group = ir::Interpreter::parse(command);
        match command_group.command {
            ir::Command::Simple(ref simple_command)
                if builtins::is_builtin(&simple_command.program) =>
            {
                self.execute_builtin(simple_command, stdout)
            }
            _ => self.execute_external(&command_group),
        }
    }

    fn execute_builtin(&mut self, command: &ir::SimpleCommand, stdout: &mut dyn Write) -> Result<()> {
        debug!("running builtin: {}", command.argv());
        if let ir::Stdio::Filename(ref filename) = command.stdin {
            open_stdin(filename)?;
        }

        match command.stdout {
            ir::Stdio::Filename(ref filename) => {
                let mut file = open_stdout(filename, false)?;
                builtins::run(self, &command.program, &command.args, &mut file)
            }
            ir::Stdio::AppendFilename(ref filename) => {
                let mut file = open_stdout(filename, true)?;
                builtins::run(self, &command.program, &command.args, &mut file)
            }
            _ => {
                let result = builtins::run(self, &command.program, &command.args, stdout);
                stdout.flush().context(ErrorKind::Io)?;
                result
            }
        }
    }

    fn execute_external(&mut self, command_group: &ir::CommandGroup) -> Result<()> {
        let mut processes = self.spawner.spawn(command_group.command.stages())?;
        match command_group.command {
            ir::Command::Simple(_) => match processes.pop() {
                Some(process) => self.wait_in_foreground(process, &command_group.input),
                None => Ok(()),
            },
            ir::Command::Pipeline(_) => wait_for_pipeline(&mut processes),
        }
    }

    /// Blocks until `process` exits, or records it as a suspended job if it
    /// stops.
    fn wait_in_foreground(&mut self, mut process: Box<dyn Process>, label: &str) -> Result<()> {
        loop {
            match process.wait()? {
                ProcessStatus::Completed => {
                    debug!("{:?} finished with {:?}", process, process.status_code());
                    return Ok(());
                }
                ProcessStatus::Stopped if self.job_table.is_full() => {
                    warn!("no room to suspend {:?}, continuing it", process);
                    report(&ErrorKind::JobTableFull.into());
                    process.signal(Signal::SIGCONT)?;
                }
                ProcessStatus::Stopped => {
                    self.job_table.add(process, label)?;
                    return Ok(());
                }
                ProcessStatus::Running => {}
            }
        }
    }

    /// Continues a suspended job and waits on it in the foreground.
    pub fn put_job_in_foreground(&mut self, job_id: JobId) -> Result<()> {
        let (mut process, label) = self.job_table.resume(job_id)?;
        debug!("putting job [{}] in foreground", job_id);
        process.signal(Signal::SIGCONT)?;
        self.wait_in_foreground(process, &label)
    }

    pub fn job_table(&self) -> &JobTable {
        &self.job_table
    }

    pub fn has_suspended_jobs(&self) -> bool {
        self.job_table.has_active_jobs()
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}\n{:?}", self.config, self.job_table)
    }
}

/// Pipelines cannot be suspended: a stopped stage is continued, and the
/// prompt only returns once every stage has terminated. Every stage is
/// waited on even if an earlier wait fails; the first failure is returned.
fn wait_for_pipeline(processes: &mut [Box<dyn Process>]) -> Result<()> {
    let mut first_error = None;
    for process in processes.iter_mut() {
        let result = wait_for_stage(process.as_mut());
        log_if_err!(result, "failed to wait for pipeline stage {}", process.id());
        if let Err(e) = result {
            first_error.get_or_insert(e);
        }
    }

    first_error.map_or(Ok(()), Err)
}

fn wait_for_stage(process: &mut dyn Process) -> Result<()> {
    loop {
        match process.wait()? {
            ProcessStatus::Completed => return Ok(()),
            ProcessStatus::Stopped => {
                debug!("continuing stopped pipeline stage {}", process.id());
                process.signal(Signal::SIGCONT)?;
            }
            ProcessStatus::Running => {}
        }
    }
}

fn report(error: &Error) {
    match failure::Fail::cause(error) {
        Some(cause) => info!("{}: {}", error, cause),
        None => info!("{}", error),
    }
    eprintln!("Error: {}", error);
}
