use nix::errno::Errno;
use thiserror::Error;

/// Every way a job-control operation can fail.
///
/// None of these stop the shell: the dispatcher reports the error and moves on
/// to the next line. Only a forked child that fails to `exec` terminates, and it
/// does so from inside [`crate::exec::run_command`]'s caller.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The command line could not be turned into a program invocation.
    #[error("parse error: {0}")]
    Parse(String),

    /// `fork()` failed; no child exists and no job was recorded.
    #[error("fork failed: {0}")]
    Fork(#[source] Errno),

    /// The program image could not be replaced (not found, not executable, ...).
    #[error("{program}: exec failed: {source}")]
    Exec {
        program: String,
        #[source]
        source: Errno,
    },

    /// A `<`, `>` or `>>` target could not be opened or installed.
    #[error("{path}: {reason}: {source}")]
    Redirection {
        path: String,
        reason: &'static str,
        #[source]
        source: Errno,
    },

    /// The job index was missing, malformed or out of range.
    #[error("job lookup failed: {0}")]
    JobLookup(String),

    /// The job exists but the operation makes no sense for its status.
    #[error("job {index} is {status}: {reason}")]
    JobState {
        index: usize,
        status: crate::jobs::JobStatus,
        reason: &'static str,
    },

    /// Moving the terminal's foreground process group failed.
    #[error("terminal control failed: {0}")]
    TerminalControl(#[source] Errno),

    /// A process-group, signal or descriptor call failed.
    #[error("{action} failed: {source}")]
    System {
        action: &'static str,
        #[source]
        source: Errno,
    },

    /// `waitpid()` failed for the given process.
    #[error("waiting for process {pid} failed: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: Errno,
    },
}
