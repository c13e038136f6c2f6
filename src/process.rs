//! Operating-system side of job control.
//!
//! Everything that forks, signals, waits or moves the terminal's foreground
//! process group goes through [`ProcessControl`], so the launcher and the job
//! state controller can be driven by a scripted implementation in tests.

use crate::command::ExitCode;
use crate::error::ShellError;
use crate::exec::{self, Invocation, SUPPRESSED_SIGNALS};
use nix::errno::Errno;
use nix::sys::signal::{killpg, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, getpgrp, setpgid, tcsetpgrp, ForkResult, Pid};
use std::io::{self, IsTerminal, Write};
use tracing::{debug, warn};

/// Why a blocking wait on a child returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Exited normally with the given status.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
    /// Stopped by a signal; still alive.
    Stopped(Signal),
}

impl WaitOutcome {
    /// True when the process is gone and has been reaped.
    pub fn is_terminated(&self) -> bool {
        !matches!(self, WaitOutcome::Stopped(_))
    }

    /// Shell-style exit code: `128 + signal` for anything signal-related.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            WaitOutcome::Exited(code) => *code,
            WaitOutcome::Signaled(signal) | WaitOutcome::Stopped(signal) => 128 + *signal as i32,
        }
    }
}

/// Process and terminal primitives used by the job-control logic.
pub trait ProcessControl {
    /// Fork a child that runs `invocation` in a new process group, returning its pid.
    fn spawn(&mut self, invocation: &Invocation) -> Result<Pid, ShellError>;

    /// Make `pgid` the terminal's foreground process group.
    fn give_terminal_to(&mut self, pgid: Pid) -> Result<(), ShellError>;

    /// Make the shell's own process group the terminal's foreground group again.
    fn reclaim_terminal(&mut self) -> Result<(), ShellError>;

    /// Send SIGCONT to every process in `pgid`.
    fn continue_job(&mut self, pgid: Pid) -> Result<(), ShellError>;

    /// Block until `pid` stops or terminates. Continuing does not end the wait.
    fn wait_for(&mut self, pid: Pid) -> Result<WaitOutcome, ShellError>;
}

/// [`ProcessControl`] backed by real POSIX calls.
///
/// Terminal hand-off only happens when standard input is a terminal. Without
/// one there is no foreground group to arbitrate, and every other operation
/// behaves the same.
#[derive(Debug)]
pub struct PosixProcessControl {
    shell_pgid: Pid,
    interactive: bool,
}

impl PosixProcessControl {
    /// Detect whether the shell is interactive and, if it is, start ignoring
    /// the background-I/O stop signals so the terminal can be reclaimed.
    pub fn new() -> Result<Self, ShellError> {
        let interactive = io::stdin().is_terminal();
        if interactive {
            ignore_suppressed_signals()?;
        }
        let control = Self {
            shell_pgid: getpgrp(),
            interactive,
        };
        debug!(shell_pgid = %control.shell_pgid, interactive, "job control initialised");
        Ok(control)
    }

    /// Variant that never touches the terminal, whatever standard input is.
    pub fn non_interactive() -> Self {
        Self {
            shell_pgid: getpgrp(),
            interactive: false,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

fn ignore_suppressed_signals() -> Result<(), ShellError> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::all());
    for signal in SUPPRESSED_SIGNALS {
        // SAFETY: SIG_IGN installs no handler code.
        unsafe { sigaction(signal, &ignore) }.map_err(|source| ShellError::System {
            action: "sigaction",
            source,
        })?;
    }
    Ok(())
}

impl ProcessControl for PosixProcessControl {
    fn spawn(&mut self, invocation: &Invocation) -> Result<Pid, ShellError> {
        // Buffered shell output must not show up after the child's.
        let _ = io::stdout().flush();

        // SAFETY: the child only performs system calls on data prepared before
        // the fork, then execs or exits.
        match unsafe { fork() }.map_err(ShellError::Fork)? {
            ForkResult::Child => {
                let Err(err) = exec::run_command(invocation);
                eprintln!("swish: {}", err);
                // SAFETY: terminates the forked child without running parent state teardown.
                unsafe { nix::libc::_exit(1) }
            }
            ForkResult::Parent { child } => {
                // The child does the same; whichever runs first wins, so the
                // group exists before any terminal hand-off.
                match setpgid(child, child) {
                    Ok(()) | Err(Errno::EACCES) => {}
                    Err(err) => warn!(pid = %child, %err, "setpgid on child failed"),
                }
                debug!(pid = %child, program = %invocation.program(), "spawned");
                Ok(child)
            }
        }
    }

    fn give_terminal_to(&mut self, pgid: Pid) -> Result<(), ShellError> {
        if !self.interactive {
            return Ok(());
        }
        debug!(%pgid, "handing terminal to job");
        tcsetpgrp(io::stdin(), pgid).map_err(ShellError::TerminalControl)
    }

    fn reclaim_terminal(&mut self) -> Result<(), ShellError> {
        if !self.interactive {
            return Ok(());
        }
        debug!(pgid = %self.shell_pgid, "reclaiming terminal");
        tcsetpgrp(io::stdin(), self.shell_pgid).map_err(ShellError::TerminalControl)
    }

    fn continue_job(&mut self, pgid: Pid) -> Result<(), ShellError> {
        debug!(%pgid, "sending SIGCONT");
        killpg(pgid, Signal::SIGCONT).map_err(|source| ShellError::System {
            action: "kill",
            source,
        })
    }

    fn wait_for(&mut self, pid: Pid) -> Result<WaitOutcome, ShellError> {
        loop {
            let outcome = match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
                Ok(WaitStatus::Exited(_, code)) => WaitOutcome::Exited(code),
                Ok(WaitStatus::Signaled(_, signal, _)) => WaitOutcome::Signaled(signal),
                Ok(WaitStatus::Stopped(_, signal)) => WaitOutcome::Stopped(signal),
                Ok(other) => {
                    debug!(%pid, status = ?other, "ignoring wait status");
                    continue;
                }
                Err(Errno::EINTR) => continue,
                Err(source) => {
                    return Err(ShellError::Wait {
                        pid: pid.as_raw(),
                        source,
                    });
                }
            };
            debug!(%pid, ?outcome, "wait returned");
            return Ok(outcome);
        }
    }
}
