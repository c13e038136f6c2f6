//! Moving tracked jobs between foreground, background and stopped.
//!
//! A job is `Background` or `Stopped` while it sits in the [`JobList`]. It
//! leaves the list exactly when a wait observes that it terminated.

use crate::error::ShellError;
use crate::jobs::{Job, JobList, JobStatus};
use crate::launcher::Placement;
use crate::process::{ProcessControl, WaitOutcome};
use nix::unistd::Pid;
use tracing::{debug, warn};

/// Turn the operator's index argument into a job index.
pub fn parse_job_index(arg: Option<&str>) -> Result<usize, ShellError> {
    let arg = arg.ok_or_else(|| ShellError::JobLookup("missing job index".to_string()))?;
    arg.parse::<usize>()
        .map_err(|_| ShellError::JobLookup(format!("invalid job index `{}`", arg)))
}

fn lookup(jobs: &JobList, index: usize) -> Result<&Job, ShellError> {
    jobs.get(index)
        .ok_or_else(|| ShellError::JobLookup(format!("no job at index {}", index)))
}

/// Continue the job at `index`.
///
/// In the foreground this blocks until the job stops again or terminates and
/// returns what ended the wait; in the background it returns `None` at once.
pub fn resume(
    jobs: &mut JobList,
    control: &mut dyn ProcessControl,
    index: usize,
    placement: Placement,
) -> Result<Option<WaitOutcome>, ShellError> {
    match placement {
        Placement::Foreground => resume_foreground(jobs, control, index).map(Some),
        Placement::Background => resume_background(jobs, control, index).map(|()| None),
    }
}

/// Give the job the terminal, continue it and wait.
///
/// A job that terminates is removed; one that stops again is marked stopped.
/// Either way the terminal goes back to the shell before this returns.
pub fn resume_foreground(
    jobs: &mut JobList,
    control: &mut dyn ProcessControl,
    index: usize,
) -> Result<WaitOutcome, ShellError> {
    let pid = lookup(jobs, index)?.pid;

    control.give_terminal_to(pid)?;
    let result = continue_and_wait(jobs, control, index, pid);
    let reclaimed = control.reclaim_terminal();

    let outcome = result?;
    reclaimed?;
    Ok(outcome)
}

fn continue_and_wait(
    jobs: &mut JobList,
    control: &mut dyn ProcessControl,
    index: usize,
    pid: Pid,
) -> Result<WaitOutcome, ShellError> {
    control.continue_job(pid)?;
    let outcome = control.wait_for(pid)?;
    if outcome.is_terminated() {
        jobs.remove(index);
    } else if let Some(job) = jobs.get_mut(index) {
        job.status = JobStatus::Stopped;
    }
    Ok(outcome)
}

/// Continue the job without giving it the terminal.
pub fn resume_background(
    jobs: &mut JobList,
    control: &mut dyn ProcessControl,
    index: usize,
) -> Result<(), ShellError> {
    let pid = lookup(jobs, index)?.pid;
    control.continue_job(pid)?;
    if let Some(job) = jobs.get_mut(index) {
        job.status = JobStatus::Background;
    }
    Ok(())
}

/// Block until the background job at `index` stops or terminates.
///
/// A terminated job is removed. A job that stops stays in the list and keeps
/// its `Background` status; only [`await_all`] records the stop.
pub fn await_one(
    jobs: &mut JobList,
    control: &mut dyn ProcessControl,
    index: usize,
) -> Result<WaitOutcome, ShellError> {
    let job = lookup(jobs, index)?;
    if job.status != JobStatus::Background {
        return Err(ShellError::JobState {
            index,
            status: job.status,
            reason: "only background jobs can be waited for",
        });
    }

    let pid = job.pid;
    let outcome = control.wait_for(pid)?;
    if outcome.is_terminated() {
        jobs.remove(index);
    }
    Ok(outcome)
}

/// Wait for every background job; returns how many terminated.
///
/// Runs in two passes. The first walks the list in order, waiting on each job
/// that was `Background` when reached: a stop is recorded in place, a
/// termination only marks the index. Stopped jobs are skipped. The second pass
/// removes the marked indices from the highest down, so no removal shifts an
/// index still to be removed and the list length never changes mid-walk.
///
/// If a wait fails, jobs already reaped are still removed before the error is
/// returned.
pub fn await_all(
    jobs: &mut JobList,
    control: &mut dyn ProcessControl,
) -> Result<usize, ShellError> {
    let mut finished = Vec::new();
    let mut failure = None;

    for index in 0..jobs.len() {
        let Some(job) = jobs.get_mut(index) else {
            break;
        };
        if job.status != JobStatus::Background {
            continue;
        }

        match control.wait_for(job.pid) {
            Ok(WaitOutcome::Stopped(signal)) => {
                debug!(pid = %job.pid, ?signal, "background job stopped");
                job.status = JobStatus::Stopped;
            }
            Ok(_) => finished.push(index),
            Err(err) => {
                warn!(pid = %job.pid, %err, "wait-all interrupted");
                failure = Some(err);
                break;
            }
        }
    }

    for &index in finished.iter().rev() {
        jobs.remove(index);
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(finished.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, ScriptedControl};
    use nix::errno::Errno;
    use nix::sys::signal::Signal;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    fn registry(entries: &[(i32, &str, JobStatus)]) -> JobList {
        let mut jobs = JobList::new();
        for (raw, name, status) in entries {
            jobs.add(pid(*raw), *name, *status);
        }
        jobs
    }

    fn names(jobs: &JobList) -> Vec<(String, JobStatus)> {
        jobs.iter()
            .map(|(_, job)| (job.name.clone(), job.status))
            .collect()
    }

    #[test]
    fn test_parse_job_index() {
        assert_eq!(parse_job_index(Some("2")).unwrap(), 2);
        assert!(matches!(parse_job_index(None), Err(ShellError::JobLookup(_))));
        assert!(matches!(parse_job_index(Some("x")), Err(ShellError::JobLookup(_))));
        assert!(matches!(parse_job_index(Some("-1")), Err(ShellError::JobLookup(_))));
    }

    #[test]
    fn test_fg_on_empty_registry_touches_nothing() {
        let mut jobs = JobList::new();
        let mut control = ScriptedControl::new();

        let err = resume(&mut jobs, &mut control, 0, Placement::Foreground).unwrap_err();

        assert!(matches!(err, ShellError::JobLookup(_)));
        assert!(control.calls.is_empty());
    }

    #[test]
    fn test_fg_terminated_job_is_removed() {
        let mut jobs = registry(&[(7, "sleep", JobStatus::Stopped), (8, "top", JobStatus::Stopped)]);
        let mut control = ScriptedControl::new().then(WaitOutcome::Exited(0));

        let outcome = resume(&mut jobs, &mut control, 0, Placement::Foreground).unwrap();

        assert_eq!(outcome, Some(WaitOutcome::Exited(0)));
        assert_eq!(names(&jobs), vec![("top".to_string(), JobStatus::Stopped)]);
        assert_eq!(
            control.calls,
            vec![
                Call::GiveTerminal(pid(7)),
                Call::Continue(pid(7)),
                Call::Wait(pid(7)),
                Call::ReclaimTerminal,
            ]
        );
    }

    #[test]
    fn test_fg_signaled_job_is_removed() {
        let mut jobs = registry(&[(7, "sleep", JobStatus::Background)]);
        let mut control = ScriptedControl::new().then(WaitOutcome::Signaled(Signal::SIGINT));

        resume_foreground(&mut jobs, &mut control, 0).unwrap();

        assert!(jobs.is_empty());
    }

    #[test]
    fn test_fg_restop_is_never_left_background() {
        let mut jobs = registry(&[(7, "cat", JobStatus::Background)]);
        let mut control = ScriptedControl::new().then(WaitOutcome::Stopped(Signal::SIGTSTP));

        resume_foreground(&mut jobs, &mut control, 0).unwrap();

        assert_eq!(jobs.get(0).unwrap().status, JobStatus::Stopped);
    }

    #[test]
    fn test_fg_reclaims_terminal_when_wait_fails() {
        let mut jobs = registry(&[(7, "cat", JobStatus::Stopped)]);
        let mut control = ScriptedControl::new().then_fail(Errno::ECHILD);

        let err = resume_foreground(&mut jobs, &mut control, 0).unwrap_err();

        assert!(matches!(err, ShellError::Wait { .. }));
        assert_eq!(control.calls.last(), Some(&Call::ReclaimTerminal));
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_bg_continues_without_terminal() {
        let mut jobs = registry(&[(9, "make", JobStatus::Stopped)]);
        let mut control = ScriptedControl::new();

        let outcome = resume(&mut jobs, &mut control, 0, Placement::Background).unwrap();

        assert_eq!(outcome, None);
        assert_eq!(jobs.get(0).unwrap().status, JobStatus::Background);
        assert_eq!(control.calls, vec![Call::Continue(pid(9))]);
        assert!(!control.touched_terminal());
    }

    #[test]
    fn test_bg_out_of_range() {
        let mut jobs = registry(&[(9, "make", JobStatus::Stopped)]);
        let mut control = ScriptedControl::new();

        let err = resume_background(&mut jobs, &mut control, 3).unwrap_err();

        assert!(matches!(err, ShellError::JobLookup(_)));
        assert!(control.calls.is_empty());
    }

    #[test]
    fn test_await_one_rejects_stopped_job() {
        let mut jobs = registry(&[(3, "vim", JobStatus::Stopped)]);
        let mut control = ScriptedControl::new();

        let err = await_one(&mut jobs, &mut control, 0).unwrap_err();

        assert!(matches!(
            err,
            ShellError::JobState {
                index: 0,
                status: JobStatus::Stopped,
                ..
            }
        ));
        assert!(control.calls.is_empty());
        assert_eq!(names(&jobs), vec![("vim".to_string(), JobStatus::Stopped)]);
    }

    #[test]
    fn test_await_one_removes_terminated_job() {
        let mut jobs = registry(&[(3, "a", JobStatus::Background), (4, "b", JobStatus::Background)]);
        let mut control = ScriptedControl::new().then(WaitOutcome::Exited(1));

        let outcome = await_one(&mut jobs, &mut control, 1).unwrap();

        assert_eq!(outcome, WaitOutcome::Exited(1));
        assert_eq!(names(&jobs), vec![("a".to_string(), JobStatus::Background)]);
        assert_eq!(control.calls, vec![Call::Wait(pid(4))]);
    }

    #[test]
    fn test_await_one_leaves_stopped_job_status_alone() {
        let mut jobs = registry(&[(3, "a", JobStatus::Background)]);
        let mut control = ScriptedControl::new().then(WaitOutcome::Stopped(Signal::SIGSTOP));

        await_one(&mut jobs, &mut control, 0).unwrap();

        assert_eq!(names(&jobs), vec![("a".to_string(), JobStatus::Background)]);
    }

    #[test]
    fn test_await_all_skips_stopped_and_removes_each_terminated_once() {
        let mut jobs = registry(&[
            (1, "a", JobStatus::Background),
            (2, "b", JobStatus::Stopped),
            (3, "c", JobStatus::Background),
            (4, "d", JobStatus::Background),
            (5, "e", JobStatus::Background),
        ]);
        let mut control = ScriptedControl::new()
            .then(WaitOutcome::Exited(0))
            .then(WaitOutcome::Stopped(Signal::SIGTTIN))
            .then(WaitOutcome::Signaled(Signal::SIGTERM))
            .then(WaitOutcome::Exited(2));

        let finished = await_all(&mut jobs, &mut control).unwrap();

        assert_eq!(finished, 3);
        assert_eq!(
            control.calls,
            vec![
                Call::Wait(pid(1)),
                Call::Wait(pid(3)),
                Call::Wait(pid(4)),
                Call::Wait(pid(5)),
            ]
        );
        assert_eq!(
            names(&jobs),
            vec![
                ("b".to_string(), JobStatus::Stopped),
                ("c".to_string(), JobStatus::Stopped),
            ]
        );
    }

    #[test]
    fn test_await_all_on_empty_registry() {
        let mut jobs = JobList::new();
        let mut control = ScriptedControl::new();

        assert_eq!(await_all(&mut jobs, &mut control).unwrap(), 0);
        assert!(control.calls.is_empty());
    }

    #[test]
    fn test_await_all_removes_reaped_jobs_before_reporting_failure() {
        let mut jobs = registry(&[
            (1, "a", JobStatus::Background),
            (2, "b", JobStatus::Background),
            (3, "c", JobStatus::Background),
        ]);
        let mut control = ScriptedControl::new()
            .then(WaitOutcome::Exited(0))
            .then_fail(Errno::ECHILD);

        let err = await_all(&mut jobs, &mut control).unwrap_err();

        assert!(matches!(err, ShellError::Wait { pid: 2, .. }));
        assert_eq!(
            names(&jobs),
            vec![
                ("b".to_string(), JobStatus::Background),
                ("c".to_string(), JobStatus::Background),
            ]
        );
    }
}
