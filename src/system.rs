use std::fmt;
use std::io;
use std::process::{Command, Stdio};

use crate::error::{Result, WarriorError};

// Program used to open launch targets with the desktop's default handler
#[cfg(target_os = "macos")]
pub const OPEN_PROGRAM: &str = "open";
#[cfg(not(target_os = "macos"))]
pub const OPEN_PROGRAM: &str = "xdg-open";

// Captured result of a finished subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.status.unwrap_or(1)
    }

    // Error for a required command that did not succeed
    #[must_use]
    pub fn failure(&self) -> WarriorError {
        WarriorError::CommandFailed {
            command: self.command.clone(),
            code: self.exit_code(),
        }
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "`{}` exited with status {code}", self.command)?,
            None => write!(f, "`{}` was terminated by a signal", self.command)?,
        }
        let stdout = self.stdout.trim_end();
        if !stdout.is_empty() {
            write!(f, "\nstdout: {stdout}")?;
        }
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            write!(f, "\nstderr: {stderr}")?;
        }
        Ok(())
    }
}

#[must_use]
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Access to the host's command line tools.
///
/// Everything that touches NetworkManager, WireGuard, CUPS or the desktop
/// goes through this trait so the workflow can run against a fake host.
pub trait CommandRunner {
    /// Run `program` to completion and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be started; a non-zero
    /// exit status is reported in the returned [`CommandOutput`].
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;

    /// Start `program` in the background without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be started.
    fn launch(&self, program: &str, args: &[&str]) -> io::Result<()>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        (**self).run(program, args)
    }

    fn launch(&self, program: &str, args: &[&str]) -> io::Result<()> {
        (**self).launch(program, args)
    }
}

// Runs commands on the real system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(CommandOutput {
            command: command_line(program, args),
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn launch(&self, program: &str, args: &[&str]) -> io::Result<()> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

// Run a command, mapping a failure to start it into a WarriorError
pub(crate) fn run<R: CommandRunner>(
    runner: &R,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput> {
    runner
        .run(program, args)
        .map_err(|source| WarriorError::Spawn {
            program: program.to_string(),
            source,
        })
}
