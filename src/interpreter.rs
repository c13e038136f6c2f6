use crate::command::{CommandFactory, ExitCode};
use crate::config::Config;
use crate::env::ShellState;
use crate::lexer;
use crate::process::ProcessControl;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use tracing::{info, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only support commands defined in this crate — BuiltinCommand and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The shell's dispatch loop: reads lines, splits them into words and hands
/// them to the first [`CommandFactory`] that recognises the command name.
///
/// Built-ins come first; anything else is launched as an external program.
///
/// Example
/// ```no_run
/// use swish::{Interpreter, PosixProcessControl};
/// let mut sh = Interpreter::with_default_commands(Box::new(PosixProcessControl::non_interactive()));
/// let code = sh.process_line("sleep 1 &", &mut std::io::stdout()).unwrap();
/// assert_eq!(code, Some(0));
/// ```
pub struct Interpreter {
    state: ShellState,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(process: Box<dyn ProcessControl>, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            state: ShellState::new(process),
            commands,
        }
    }

    /// Create an interpreter with the default set of commands:
    /// - built-ins: `pwd`, `cd`, `exit`, `jobs`, `fg`, `bg`, `wait-for`, `wait-all`
    /// - external command launcher
    pub fn with_default_commands(process: Box<dyn ProcessControl>) -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(
            process,
            vec![
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Jobs>::default()),
                Box::new(Factory::<Fg>::default()),
                Box::new(Factory::<Bg>::default()),
                Box::new(Factory::<WaitFor>::default()),
                Box::new(Factory::<WaitAll>::default()),
                Box::new(Factory::<ExternalCommand>::default()),
            ],
        )
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    /// True once `exit` has run.
    pub fn should_exit(&self) -> bool {
        self.state.env.should_exit
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code or an error if no factory recognises
    /// the name or the command fails to execute.
    pub fn run(&mut self, name: &str, args: &[&str], stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(name, args) {
                return cmd.execute(stdout, &mut self.state);
            }
        }
        Err(anyhow::anyhow!("command not found: {}", name))
    }

    /// Tokenize and dispatch one input line.
    ///
    /// Returns `None` for a line with no words, which dispatches nothing.
    pub fn process_line(&mut self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<Option<ExitCode>> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let words = lexer::split_into_words(line)?;
        let Some((name, rest)) = words.split_first() else {
            return Ok(None);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.run(name, &args, stdout).map(Some)
    }

    /// Interactive read loop. Returns on end of input or `exit`.
    pub fn repl(&mut self, config: &Config) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.should_exit() {
            match rl.readline(&config.prompt) {
                Ok(line) => {
                    if config.history && !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    let mut stdout = io::stdout();
                    if let Err(e) = self.process_line(&line, &mut stdout) {
                        writeln!(stdout, "Failed to parse command: {:#}", e)?;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if !self.state.jobs.is_empty() {
            warn!(remaining = self.state.jobs.len(), "leaving jobs behind");
        }
        info!("shell exiting");
        Ok(())
    }
}
