//! Preparing and replacing a child's process image.
//!
//! An [`Invocation`] is built in the parent before forking, so the child only
//! has to make system calls. [`run_command`] is the child half.

use crate::error::ShellError;
use nix::fcntl::{open, OFlag};
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2, execvp, setpgid, Pid};
use std::borrow::Cow;
use std::convert::Infallible;
use std::ffi::{CStr, CString};
use std::os::fd::RawFd;

/// Signals the interactive shell ignores and its children must not inherit as ignored.
pub const SUPPRESSED_SIGNALS: [Signal; 2] = [Signal::SIGTTIN, Signal::SIGTTOU];

/// How `>`-style redirections open their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `>`
    Truncate,
    /// `>>`
    Append,
}

/// A program invocation with its redirections split out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<CString>,
    input: Option<CString>,
    output: Option<(CString, OutputMode)>,
}

impl Invocation {
    /// Scan `words` once, pulling out `<`, `>` and `>>` together with the file
    /// name that follows each of them.
    ///
    /// When several output redirections are given the last one wins.
    pub fn parse<S: AsRef<str>>(words: &[S]) -> Result<Self, ShellError> {
        let mut argv = Vec::with_capacity(words.len());
        let mut input = None;
        let mut output = None;

        let mut iter = words.iter().map(AsRef::as_ref);
        while let Some(word) = iter.next() {
            let mode = match word {
                "<" => None,
                ">" => Some(OutputMode::Truncate),
                ">>" => Some(OutputMode::Append),
                _ => {
                    argv.push(to_cstring(word)?);
                    continue;
                }
            };

            let target = iter
                .next()
                .ok_or_else(|| ShellError::Parse(format!("missing file name after `{}`", word)))?;
            let target = to_cstring(target)?;
            match mode {
                None => input = Some(target),
                Some(mode) => output = Some((target, mode)),
            }
        }

        if argv.is_empty() {
            return Err(ShellError::Parse("missing command".to_string()));
        }

        Ok(Self {
            argv,
            input,
            output,
        })
    }

    /// Name of the program to run, the first argv element.
    pub fn program(&self) -> Cow<'_, str> {
        self.argv[0].to_string_lossy()
    }

    pub fn argv(&self) -> &[CString] {
        &self.argv
    }

    pub fn input(&self) -> Option<&CStr> {
        self.input.as_deref()
    }

    pub fn output(&self) -> Option<(&CStr, OutputMode)> {
        self.output.as_ref().map(|(path, mode)| (path.as_c_str(), *mode))
    }
}

fn to_cstring(word: &str) -> Result<CString, ShellError> {
    CString::new(word).map_err(|_| ShellError::Parse(format!("NUL byte in `{}`", word.escape_debug())))
}

/// Turn the calling process into `invocation`.
///
/// Must only run in a freshly forked child. On success the process image is
/// replaced and this never returns; any error leaves the child in an
/// unspecified state and the caller must terminate it.
pub fn run_command(invocation: &Invocation) -> Result<Infallible, ShellError> {
    restore_default_signals()?;

    setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(|source| ShellError::System {
        action: "setpgid",
        source,
    })?;

    if let Some(path) = invocation.input() {
        redirect(path, OFlag::O_RDONLY, STDIN_FILENO, "cannot open input file")?;
    }
    if let Some((path, mode)) = invocation.output() {
        let flags = OFlag::O_WRONLY
            | OFlag::O_CREAT
            | match mode {
                OutputMode::Truncate => OFlag::O_TRUNC,
                OutputMode::Append => OFlag::O_APPEND,
            };
        redirect(path, flags, STDOUT_FILENO, "cannot open output file")?;
    }

    let program = &invocation.argv[0];
    execvp(program, &invocation.argv).map_err(|source| ShellError::Exec {
        program: program.to_string_lossy().into_owned(),
        source,
    })
}

fn restore_default_signals() -> Result<(), ShellError> {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::all());
    for signal in SUPPRESSED_SIGNALS {
        // SAFETY: installing SIG_DFL runs no Rust code in signal context.
        unsafe { sigaction(signal, &default) }.map_err(|source| ShellError::System {
            action: "sigaction",
            source,
        })?;
    }
    Ok(())
}

fn redirect(path: &CStr, flags: OFlag, target: RawFd, reason: &'static str) -> Result<(), ShellError> {
    let redirection_error = |source| ShellError::Redirection {
        path: path.to_string_lossy().into_owned(),
        reason,
        source,
    };

    let fd = open(path, flags, Mode::S_IRUSR | Mode::S_IWUSR).map_err(redirection_error)?;
    if fd != target {
        dup2(fd, target).map_err(redirection_error)?;
        close(fd).map_err(redirection_error)?;
    }
    Ok(())
}
