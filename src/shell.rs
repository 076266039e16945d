//! Shell command capability
//!
//! The file store asks the host shell to create the cache file and open up its
//! permissions. Going through a trait keeps that side effect injectable.

use std::fmt;
use std::io;
use std::process::Command;

/// Executes a single shell command line
pub trait ShellExecutor: Send + Sync + fmt::Debug {
    /// Runs `command` and returns its standard output
    fn exec(&self, command: &str) -> io::Result<String>;
}

/// Runs commands through `sh -c`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShell;

impl ShellExecutor for SystemShell {
    fn exec(&self, command: &str) -> io::Result<String> {
        let output = Command::new("sh").arg("-c").arg(command).output()?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "`{}` exited with {}: {}",
                command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Quotes a value for safe use as a single shell word
pub fn quote_arg(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
