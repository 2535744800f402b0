//! In-memory `Spawner` and `Process` used to test the shell without
//! launching anything.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::ExitStatus;
use std::rc::Rc;

use nix::sys::signal::Signal;

use crate::{
    core::intermediate_representation as ir,
    errors::{ErrorKind, Result},
    execute_command::{Process, ProcessId, ProcessStatus, Spawner},
    util::NyushExitStatusExt,
};

pub type SignalLog = Rc<RefCell<Vec<(ProcessId, Signal)>>>;
pub type WaitLog = Rc<RefCell<Vec<ProcessId>>>;

/// A process whose state changes are scripted: each `wait` pops the next
/// event, and a process with no events left exits.
pub struct FakeProcess {
    id: ProcessId,
    argv: String,
    events: VecDeque<ProcessStatus>,
    status: ProcessStatus,
    /// Returned by the first `wait`.
    wait_error: Option<ErrorKind>,
    signals: SignalLog,
    waits: WaitLog,
}

impl FakeProcess {
    pub fn new(pid: u32, argv: &str, events: &[ProcessStatus], signals: SignalLog) -> Self {
        Self {
            id: pid.into(),
            argv: argv.into(),
            events: events.iter().cloned().collect(),
            status: ProcessStatus::Running,
            wait_error: None,
            signals,
            waits: Default::default(),
        }
    }

    /// A process that is already suspended.
    pub fn stopped(pid: u32, events: &[ProcessStatus]) -> Self {
        let mut process = Self::new(pid, "fake", events, Default::default());
        process.status = ProcessStatus::Stopped;
        process
    }
}

impl Process for FakeProcess {
    fn id(&self) -> ProcessId {
        self.id
    }

    fn argv(&self) -> String {
        self.argv.clone()
    }

    fn status(&self) -> ProcessStatus {
        self.status
    }

    fn status_code(&self) -> Option<ExitStatus> {
        if self.is_terminated() {
            Some(ExitStatus::from_success())
        } else {
            None
        }
    }

    fn wait(&mut self) -> Result<ProcessStatus> {
        self.waits.borrow_mut().push(self.id);
        if let Some(kind) = self.wait_error.take() {
            return Err(kind.into());
        }

        if !self.is_terminated() {
            self.status = self.events.pop_front().unwrap_or(ProcessStatus::Completed);
        }
        Ok(self.status)
    }

    fn try_wait(&mut self) -> Result<Option<ProcessStatus>> {
        if self.is_terminated() {
            return Ok(Some(self.status));
        }

        Ok(self.events.pop_front().map(|status| {
            self.status = status;
            status
        }))
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        self.signals.borrow_mut().push((self.id, signal));
        if signal == Signal::SIGCONT && self.status == ProcessStatus::Stopped {
            self.status = ProcessStatus::Running;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Script {
    events: Vec<ProcessStatus>,
    wait_error: Option<ErrorKind>,
}

/// Hands out `FakeProcess`es, one script per launched stage, and records what
/// it was asked to launch.
#[derive(Default)]
pub struct FakeSpawner {
    scripts: VecDeque<Script>,
    failure: Option<ErrorKind>,
    next_pid: u32,
    spawned: Rc<RefCell<Vec<ir::SimpleCommand>>>,
    signals: SignalLog,
    waits: WaitLog,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self {
            next_pid: 100,
            ..Default::default()
        }
    }

    /// Events for the next stage launched.
    pub fn script(mut self, events: &[ProcessStatus]) -> Self {
        self.scripts.push_back(Script {
            events: events.to_vec(),
            wait_error: None,
        });
        self
    }

    /// Makes the first `wait` on the next stage launched fail with `kind`.
    pub fn wait_error(mut self, kind: ErrorKind) -> Self {
        self.scripts.push_back(Script {
            events: Vec::new(),
            wait_error: Some(kind),
        });
        self
    }

    /// Makes the next `spawn` fail with `kind`.
    pub fn fail_with(mut self, kind: ErrorKind) -> Self {
        self.failure = Some(kind);
        self
    }

    pub fn spawned(&self) -> Rc<RefCell<Vec<ir::SimpleCommand>>> {
        Rc::clone(&self.spawned)
    }

    pub fn signals(&self) -> SignalLog {
        Rc::clone(&self.signals)
    }

    /// Pids in the order `wait` was called on them.
    pub fn waits(&self) -> WaitLog {
        Rc::clone(&self.waits)
    }
}

impl Spawner for FakeSpawner {
    fn spawn(&mut self, stages: &[ir::SimpleCommand]) -> Result<Vec<Box<dyn Process>>> {
        if let Some(kind) = self.failure.take() {
            return Err(kind.into());
        }

        let mut processes: Vec<Box<dyn Process>> = Vec::new();
        for stage in stages {
            self.spawned.borrow_mut().push(stage.clone());
            let script = self.scripts.pop_front().unwrap_or_default();
            self.next_pid += 1;
            let mut process = FakeProcess::new(
                self.next_pid,
                &stage.argv(),
                &script.events,
                Rc::clone(&self.signals),
            );
            process.wait_error = script.wait_error;
            process.waits = Rc::clone(&self.waits);
            processes.push(Box::new(process));
        }

        Ok(processes)
    }
}
