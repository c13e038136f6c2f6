use argh::FromArgs;

/// Prompt printed before each input line.
pub const DEFAULT_PROMPT: &str = "@> ";

#[derive(FromArgs, Debug)]
/// A small interactive shell with job control.
pub struct Options {
    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// prompt printed before each input line
    pub prompt: String,

    #[argh(option, short = 'c')]
    /// run a single command line and exit with its status
    pub command: Option<String>,

    #[argh(switch, short = 'v')]
    /// log process-control steps at debug level
    pub verbose: bool,

    #[argh(switch)]
    /// do not keep entered lines in the line-editor history
    pub no_history: bool,
}

/// Settings the shell runs with, resolved from [`Options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub command: Option<String>,
    pub history: bool,
    /// Default `tracing` filter, used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            command: None,
            history: true,
            log_filter: "warn".to_string(),
        }
    }
}

impl From<Options> for Config {
    fn from(options: Options) -> Self {
        Self {
            prompt: options.prompt,
            command: options.command,
            history: !options.no_history,
            log_filter: if options.verbose { "debug" } else { "warn" }.to_string(),
        }
    }
}
