use anyhow::{Context, Result};
use swish::config::{Config, Options};
use swish::{Interpreter, PosixProcessControl};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> std::process::ExitCode {
    let options: Options = argh::from_env();
    let config = Config::from(options);

    // RUST_LOG wins over --verbose.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(&config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("swish: {e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<std::process::ExitCode> {
    let process = PosixProcessControl::new().context("failed to set up job control")?;
    let mut sh = Interpreter::with_default_commands(Box::new(process));

    if let Some(line) = &config.command {
        let code = sh.process_line(line, &mut std::io::stdout())?.unwrap_or(0);
        return Ok(std::process::ExitCode::from(u8::try_from(code).unwrap_or(1)));
    }

    sh.repl(config)?;
    Ok(std::process::ExitCode::SUCCESS)
}
