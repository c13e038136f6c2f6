//! A small interactive shell with POSIX job control.
//!
//! Programs are launched in their own process groups, either in the
//! foreground (owning the terminal until they stop or finish) or in the
//! background. Stopped and background programs are tracked as jobs that can be
//! listed, resumed in either place, and waited for.
//!
//! The main entry point is [`Interpreter`]. All process and terminal calls go
//! through the [`process::ProcessControl`] trait; [`PosixProcessControl`] is the
//! real implementation.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod exec;
mod external;
mod interpreter;
pub mod job_control;
pub mod jobs;
pub mod launcher;
pub mod lexer;
pub mod process;
#[cfg(test)]
mod testing;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
pub use error::ShellError;
pub use process::PosixProcessControl;
