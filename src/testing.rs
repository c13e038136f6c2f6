//! Scripted [`ProcessControl`] used by unit tests.

use crate::error::ShellError;
use crate::exec::Invocation;
use crate::process::{ProcessControl, WaitOutcome};
use nix::errno::Errno;
use nix::unistd::Pid;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One recorded call on the double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Spawn(String),
    GiveTerminal(Pid),
    ReclaimTerminal,
    Continue(Pid),
    Wait(Pid),
}

/// Records every call and answers waits from a queue of canned outcomes.
#[derive(Debug, Default)]
pub(crate) struct ScriptedControl {
    pub calls: Vec<Call>,
    pub next_pid: i32,
    pub outcomes: VecDeque<Result<WaitOutcome, Errno>>,
    pub fail_spawn: bool,
    pub fail_handoff: bool,
}

impl ScriptedControl {
    pub fn new() -> Self {
        Self {
            next_pid: 100,
            ..Default::default()
        }
    }

    /// Queue the result of the next `wait_for`.
    pub fn then(mut self, outcome: WaitOutcome) -> Self {
        self.outcomes.push_back(Ok(outcome));
        self
    }

    pub fn then_fail(mut self, errno: Errno) -> Self {
        self.outcomes.push_back(Err(errno));
        self
    }

    /// Whether any call touched the terminal.
    pub fn touched_terminal(&self) -> bool {
        self.calls
            .iter()
            .any(|call| matches!(call, Call::GiveTerminal(_) | Call::ReclaimTerminal))
    }
}

impl ProcessControl for ScriptedControl {
    fn spawn(&mut self, invocation: &Invocation) -> Result<Pid, ShellError> {
        self.calls.push(Call::Spawn(invocation.program().into_owned()));
        if self.fail_spawn {
            return Err(ShellError::Fork(Errno::EAGAIN));
        }
        let pid = Pid::from_raw(self.next_pid);
        self.next_pid += 1;
        Ok(pid)
    }

    fn give_terminal_to(&mut self, pgid: Pid) -> Result<(), ShellError> {
        self.calls.push(Call::GiveTerminal(pgid));
        if self.fail_handoff {
            return Err(ShellError::TerminalControl(Errno::ENOTTY));
        }
        Ok(())
    }

    fn reclaim_terminal(&mut self) -> Result<(), ShellError> {
        self.calls.push(Call::ReclaimTerminal);
        Ok(())
    }

    fn continue_job(&mut self, pgid: Pid) -> Result<(), ShellError> {
        self.calls.push(Call::Continue(pgid));
        Ok(())
    }

    fn wait_for(&mut self, pid: Pid) -> Result<WaitOutcome, ShellError> {
        self.calls.push(Call::Wait(pid));
        match self.outcomes.pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(source)) => Err(ShellError::Wait {
                pid: pid.as_raw(),
                source,
            }),
            None => panic!("unexpected wait for {}", pid),
        }
    }
}

/// Handle to a [`ScriptedControl`] that stays inspectable after being boxed
/// into an interpreter.
#[derive(Debug, Clone)]
pub(crate) struct SharedControl(pub Rc<RefCell<ScriptedControl>>);

impl SharedControl {
    pub fn new(control: ScriptedControl) -> Self {
        Self(Rc::new(RefCell::new(control)))
    }
}

impl ProcessControl for SharedControl {
    fn spawn(&mut self, invocation: &Invocation) -> Result<Pid, ShellError> {
        self.0.borrow_mut().spawn(invocation)
    }

    fn give_terminal_to(&mut self, pgid: Pid) -> Result<(), ShellError> {
        self.0.borrow_mut().give_terminal_to(pgid)
    }

    fn reclaim_terminal(&mut self) -> Result<(), ShellError> {
        self.0.borrow_mut().reclaim_terminal()
    }

    fn continue_job(&mut self, pgid: Pid) -> Result<(), ShellError> {
        self.0.borrow_mut().continue_job(pgid)
    }

    fn wait_for(&mut self, pid: Pid) -> Result<WaitOutcome, ShellError> {
        self.0.borrow_mut().wait_for(pid)
    }
}
