use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::ShellState;
use crate::interpreter::Factory;
use crate::launcher;
use anyhow::Result;
use std::io::Write;

/// Command that is not a builtin.
///
/// Holds the whole word list, redirections and background marker included;
/// the launcher sorts them out.
pub struct ExternalCommand {
    words: Vec<String>,
}

impl ExternalCommand {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }
}

/// Accepts every name, so it has to be the last factory consulted.
impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        let words = std::iter::once(name)
            .chain(args.iter().copied())
            .map(str::to_owned)
            .collect();
        Some(Box::new(ExternalCommand::new(words)))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, shell: &mut ShellState) -> Result<ExitCode> {
        match launcher::launch(&self.words, &mut shell.jobs, shell.process.as_mut()) {
            Ok(launched) => Ok(launched.exit_code()),
            Err(e) => {
                tracing::debug!(words = ?self.words, error = ?e, "launch failed");
                writeln!(stdout, "swish: {}", e)?;
                Ok(1)
            }
        }
    }
}
