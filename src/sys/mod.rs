//! System collaborators: process execution, file access and temp files.
//!
//! Wrappers reach the outside world only through this module, so tests can
//! substitute a scripted [`CommandRunner`].

mod file;

pub use file::{extension, file_exists, file_part, path_from_bytes, read, tmp_file};

use std::io;
use std::process::Command;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Exit code, or -1 if the process was terminated by a signal.
    pub exit_code: i32,
    pub std_out: String,
    pub std_err: String,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a command synchronously and captures its output.
///
/// `args[0]` is the program; the remaining tokens are passed through
/// unchanged, never re-quoted or handed to a shell.
pub trait CommandRunner: Send + Sync {
    fn run(&self, args: &[String]) -> io::Result<RunResult>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, args: &[String]) -> io::Result<RunResult> {
        let (program, rest) = args.split_first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "empty command line")
        })?;

        let output = Command::new(program).args(rest).output()?;

        Ok(RunResult {
            exit_code: output.status.code().unwrap_or(-1),
            std_out: String::from_utf8_lossy(&output.stdout).into_owned(),
            std_err: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
