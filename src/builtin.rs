use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::ShellState;
use crate::interpreter::Factory;
use crate::job_control;
use crate::launcher::Placement;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in the shell's own process, never in a child.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "fg" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the shell state.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        match BuiltinCommand::execute(*self, stdout, shell) {
            Ok(x) => Ok(x),
            Err(e) => {
                tracing::debug!(command = T::name(), error = ?e, "builtin failed");
                writeln!(stdout, "{:#}", e)?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _shell: &mut ShellState) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        writeln!(stdout, "{}", shell.env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        let env = &mut shell.env;
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => {
                if let Some(home) = env.get_var("HOME") {
                    PathBuf::from(home)
                } else {
                    return Err(anyhow::anyhow!("cd: no target and HOME not set"));
                }
            }
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell. Jobs still running are left running.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        shell.env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List tracked jobs as `<index>: <name> (background|stopped)`.
pub struct Jobs {}

impl BuiltinCommand for Jobs {
    fn name() -> &'static str {
        "jobs"
    }

    fn execute(self, stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        for (index, job) in shell.jobs.iter() {
            writeln!(stdout, "{}: {} ({})", index, job.name, job.status)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Continue a job in the foreground and wait for it to stop or finish.
pub struct Fg {
    #[argh(positional)]
    /// index of the job, as printed by `jobs`
    pub index: Option<String>,
}

impl BuiltinCommand for Fg {
    fn name() -> &'static str {
        "fg"
    }

    fn execute(self, _stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        let index = job_control::parse_job_index(self.index.as_deref())
            .context("Failed to resume job in foreground")?;
        let outcome = job_control::resume(
            &mut shell.jobs,
            shell.process.as_mut(),
            index,
            Placement::Foreground,
        )
        .context("Failed to resume job in foreground")?;
        Ok(outcome.map_or(0, |outcome| outcome.exit_code()))
    }
}

#[derive(FromArgs)]
/// Continue a stopped job in the background.
pub struct Bg {
    #[argh(positional)]
    /// index of the job, as printed by `jobs`
    pub index: Option<String>,
}

impl BuiltinCommand for Bg {
    fn name() -> &'static str {
        "bg"
    }

    fn execute(self, _stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        let index = job_control::parse_job_index(self.index.as_deref())
            .context("Failed to resume job in background")?;
        job_control::resume(
            &mut shell.jobs,
            shell.process.as_mut(),
            index,
            Placement::Background,
        )
        .context("Failed to resume job in background")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Wait for one background job to stop or finish.
pub struct WaitFor {
    #[argh(positional)]
    /// index of the job, as printed by `jobs`
    pub index: Option<String>,
}

impl BuiltinCommand for WaitFor {
    fn name() -> &'static str {
        "wait-for"
    }

    fn execute(self, _stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        let index = job_control::parse_job_index(self.index.as_deref())
            .context("Failed to wait for background job")?;
        let outcome = job_control::await_one(&mut shell.jobs, shell.process.as_mut(), index)
            .context("Failed to wait for background job")?;
        Ok(outcome.exit_code())
    }
}

#[derive(FromArgs)]
/// Wait for every background job to stop or finish.
pub struct WaitAll {}

impl BuiltinCommand for WaitAll {
    fn name() -> &'static str {
        "wait-all"
    }

    fn execute(self, _stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        let finished = job_control::await_all(&mut shell.jobs, shell.process.as_mut())
            .context("Failed to wait for all background jobs")?;
        tracing::debug!(finished, "wait-all done");
        Ok(0)
    }
}
