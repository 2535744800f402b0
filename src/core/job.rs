//! The job table: suspended jobs, listed and resumed by their 1-based
//! display index.
//!
//! Slots are never removed or reused. A slot stays `Active` while its process
//! is suspended and becomes `Inactive` for good once the job is resumed or
//! its process is found to have terminated.

use std::fmt;

use log::{debug, info};

use crate::{
    errors::{Error, ErrorKind, Result},
    execute_command::{Process, ProcessId, ProcessStatus},
};

/// Display index of a job: its table slot plus one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct JobId(pub u32);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobState {
    Active,
    Inactive,
}

pub struct Job {
    id: JobId,
    pid: ProcessId,
    label: String,
    state: JobState,
    /// `None` once the job is `Inactive`.
    process: Option<Box<dyn Process>>,
}

impl Job {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == JobState::Active
    }

    fn deactivate(&mut self) -> Option<Box<dyn Process>> {
        self.state = JobState::Inactive;
        self.process.take()
    }
}

pub struct JobTable {
    jobs: Vec<Job>,
    capacity: usize,
}

impl JobTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.capacity
    }

    /// Records a suspended process in the next free slot.
    pub fn add(&mut self, process: Box<dyn Process>, label: &str) -> Result<JobId> {
        if self.is_full() {
            return Err(ErrorKind::JobTableFull.into());
        }

        let id = JobId(self.jobs.len() as u32 + 1);
        info!("job [{}] suspended: {}", id, label);
        self.jobs.push(Job {
            id,
            pid: process.id(),
            label: label.to_string(),
            state: JobState::Active,
            process: Some(process),
        });
        Ok(id)
    }

    /// Active jobs in table order.
    pub fn list(&self) -> impl Iterator<Item = &Job> + '_ {
        self.jobs.iter().filter(|job| job.is_active())
    }

    pub fn has_active_jobs(&self) -> bool {
        self.list().next().is_some()
    }

    pub fn get(&self, job_id: JobId) -> Option<&Job> {
        self.find_job(job_id).map(|index| &self.jobs[index])
    }

    /// Marks an active job `Inactive` and hands back its process so it can
    /// be continued, along with the job's label.
    pub fn resume(&mut self, job_id: JobId) -> Result<(Box<dyn Process>, String)> {
        let index = self
            .find_job(job_id)
            .filter(|&index| self.jobs[index].is_active())
            .ok_or_else(Error::invalid_job)?;
        let job = &mut self.jobs[index];
        let process = job.deactivate().ok_or_else(Error::invalid_job)?;
        debug!("resuming job [{}] ({})", job.id, job.pid);
        Ok((process, job.label.clone()))
    }

    /// Deactivates jobs whose processes terminated while suspended, without
    /// blocking.
    pub fn reap(&mut self) {
        for job in self.jobs.iter_mut().filter(|job| job.is_active()) {
            let status = match job.process.as_mut() {
                Some(process) => process.try_wait(),
                None => Ok(Some(ProcessStatus::Completed)),
            };
            log_if_err!(status, "failed to poll job [{}]", job.id);

            if let Ok(Some(ProcessStatus::Completed)) = status {
                info!("job [{}] ({}) terminated while suspended", job.id, job.pid);
                job.deactivate();
            }
        }
    }

    fn find_job(&self, job_id: JobId) -> Option<usize> {
        (job_id.0 as usize)
            .checked_sub(1)
            .filter(|&index| index < self.jobs.len())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.label)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}\tpid: {}\tstate: {:?}\tlabel: {}",
            self.id, self.pid, self.state, self.label
        )
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs\tcapacity: {}", self.jobs.len(), self.capacity)?;
        for job in &self.jobs {
            writeln!(f, "{:?}", job)?;
        }

        Ok(())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for JobId {
    fn from(value: u32) -> Self {
        JobId(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProcess;

    fn stopped(pid: u32, events: &[ProcessStatus]) -> Box<dyn Process> {
        Box::new(FakeProcess::stopped(pid, events))
    }

    fn labels(table: &JobTable) -> Vec<String> {
        table.list().map(|job| job.to_string()).collect()
    }

    #[test]
    fn test_add_and_list() {
        let mut table = JobTable::with_capacity(100);
        assert!(!table.has_active_jobs());
        assert_eq!(table.add(stopped(10, &[]), "sleep 10").unwrap(), JobId(1));
        assert_eq!(table.add(stopped(11, &[]), "cat").unwrap(), JobId(2));

        assert!(table.has_active_jobs());
        assert_eq!(labels(&table), vec!["[1] sleep 10", "[2] cat"]);
        // Listing is restartable.
        assert_eq!(table.list().count(), 2);
        assert_eq!(table.get(JobId(2)).unwrap().pid(), ProcessId::from(11));
    }

    #[test]
    fn test_resume_keeps_slot() {
        let mut table = JobTable::with_capacity(100);
        table.add(stopped(10, &[]), "a").unwrap();
        table.add(stopped(11, &[]), "b").unwrap();

        let (process, label) = table.resume(JobId(1)).unwrap();
        assert_eq!(process.id(), ProcessId::from(10));
        assert_eq!(label, "a");
        assert_eq!(labels(&table), vec!["[2] b"]);
        assert_eq!(table.get(JobId(1)).unwrap().state(), JobState::Inactive);

        // Display indices are never reused.
        assert_eq!(table.add(stopped(12, &[]), "c").unwrap(), JobId(3));
        assert_eq!(labels(&table), vec!["[2] b", "[3] c"]);
    }

    #[test]
    fn test_resume_invalid_job() {
        let mut table = JobTable::with_capacity(100);
        table.add(stopped(10, &[]), "a").unwrap();

        for job_id in &[JobId(0), JobId(2), JobId(100)] {
            let error = table.resume(*job_id).unwrap_err();
            assert_eq!(*error.kind(), ErrorKind::InvalidJob);
        }

        table.resume(JobId(1)).unwrap();
        let error = table.resume(JobId(1)).unwrap_err();
        assert_eq!(*error.kind(), ErrorKind::InvalidJob);
    }

    #[test]
    fn test_full_table() {
        let mut table = JobTable::with_capacity(2);
        table.add(stopped(10, &[]), "a").unwrap();
        table.add(stopped(11, &[]), "b").unwrap();
        table.resume(JobId(1)).unwrap();

        // Resumed slots still count against the capacity.
        assert!(table.is_full());
        let error = table.add(stopped(12, &[]), "c").unwrap_err();
        assert_eq!(*error.kind(), ErrorKind::JobTableFull);
        assert_eq!(labels(&table), vec!["[2] b"]);
    }

    #[test]
    fn test_reap_terminated_jobs() {
        let mut table = JobTable::with_capacity(100);
        table.add(stopped(10, &[ProcessStatus::Completed]), "killed").unwrap();
        table.add(stopped(11, &[]), "still stopped").unwrap();

        table.reap();
        assert_eq!(labels(&table), vec!["[2] still stopped"]);
        assert_eq!(table.get(JobId(1)).unwrap().state(), JobState::Inactive);
        assert_eq!(*table.resume(JobId(1)).unwrap_err().kind(), ErrorKind::InvalidJob);
    }
}
