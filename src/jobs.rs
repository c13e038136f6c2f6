use nix::unistd::Pid;
use std::fmt;

/// Lifecycle state of a tracked job.
///
/// Jobs running in the foreground are never tracked, so these are the only two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Background,
    Stopped,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Background => f.write_str("background"),
            JobStatus::Stopped => f.write_str("stopped"),
        }
    }
}

/// A child process the shell has stopped waiting on synchronously.
///
/// The process is the leader of its own process group, so `pid` doubles as the
/// group id used for terminal hand-off and signal delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub pid: Pid,
    pub name: String,
    pub status: JobStatus,
}

/// Ordered collection of jobs.
///
/// Jobs are addressed by their position in insertion order. Positions are not
/// stable: removing a job shifts every later job down by one.
#[derive(Debug, Default)]
pub struct JobList {
    jobs: Vec<Job>,
}

impl JobList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job at the end of the list.
    pub fn add(&mut self, pid: Pid, name: impl Into<String>, status: JobStatus) {
        let name = name.into();
        tracing::debug!(%pid, %name, %status, index = self.jobs.len(), "job added");
        self.jobs.push(Job { pid, name, status });
    }

    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    /// Handle allowing the job's status to be changed in place.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Job> {
        self.jobs.get_mut(index)
    }

    /// Remove and return the job at `index`, shifting later jobs down.
    pub fn remove(&mut self, index: usize) -> Option<Job> {
        if index >= self.jobs.len() {
            return None;
        }
        let job = self.jobs.remove(index);
        tracing::debug!(pid = %job.pid, name = %job.name, index, "job removed");
        Some(job)
    }

    /// `(index, job)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Job)> {
        self.jobs.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
