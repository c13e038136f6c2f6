//! Starting external programs in the foreground or background.

use crate::command::ExitCode;
use crate::error::ShellError;
use crate::exec::Invocation;
use crate::jobs::{JobList, JobStatus};
use crate::process::{ProcessControl, WaitOutcome};
use nix::unistd::Pid;
use tracing::{debug, error};

/// Trailing word that asks for a background launch.
pub const BACKGROUND_MARKER: &str = "&";

/// Where a job runs relative to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Foreground,
    Background,
}

/// Result of a successful launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launched {
    /// Started without waiting and recorded as a background job.
    Background { pid: Pid },
    /// Ran in the foreground until it stopped or terminated. A stopped child
    /// has been recorded as a job.
    Foreground { pid: Pid, outcome: WaitOutcome },
}

impl Launched {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Launched::Background { .. } => 0,
            Launched::Foreground { outcome, .. } => outcome.exit_code(),
        }
    }
}

/// Strip a trailing [`BACKGROUND_MARKER`] from `words`.
pub fn split_placement<S: AsRef<str>>(words: &[S]) -> (&[S], Placement) {
    match words.split_last() {
        Some((last, rest)) if last.as_ref() == BACKGROUND_MARKER => (rest, Placement::Background),
        _ => (words, Placement::Foreground),
    }
}

/// Launch the program described by `words`.
///
/// Background launches are registered immediately. Foreground launches get the
/// terminal, block until the child stops or terminates, record it if it
/// stopped, and give the terminal back to the shell before returning.
///
/// If the shell dies between the child stopping and the terminal being
/// reclaimed, the terminal stays with the stopped group.
pub fn launch<S: AsRef<str>>(
    words: &[S],
    jobs: &mut JobList,
    control: &mut dyn ProcessControl,
) -> Result<Launched, ShellError> {
    let (words, placement) = split_placement(words);
    let invocation = Invocation::parse(words)?;
    let name = invocation.program().into_owned();

    let pid = control.spawn(&invocation)?;

    match placement {
        Placement::Background => {
            jobs.add(pid, name, JobStatus::Background);
            Ok(Launched::Background { pid })
        }
        Placement::Foreground => {
            let outcome = run_in_foreground(pid, name, jobs, control)?;
            Ok(Launched::Foreground { pid, outcome })
        }
    }
}

fn run_in_foreground(
    pid: Pid,
    name: String,
    jobs: &mut JobList,
    control: &mut dyn ProcessControl,
) -> Result<WaitOutcome, ShellError> {
    // A failed hand-off still leaves a running child that has to be waited on.
    let handoff = control.give_terminal_to(pid);
    if let Err(err) = &handoff {
        error!(%pid, %err, "could not hand terminal to child");
    }

    let waited = control.wait_for(pid);
    if let Ok(WaitOutcome::Stopped(signal)) = waited {
        debug!(%pid, ?signal, "foreground child stopped");
        jobs.add(pid, name, JobStatus::Stopped);
    }

    let reclaimed = match handoff {
        Ok(()) => control.reclaim_terminal(),
        Err(_) => Ok(()),
    };

    handoff?;
    let outcome = waited?;
    reclaimed?;
    Ok(outcome)
}
