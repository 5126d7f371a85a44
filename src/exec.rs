//! Synchronous external command execution
//!
//! Every external tool (probe, activation script, package manager, index
//! query) goes through [`CommandRunner`], so the resolvers and the install
//! orchestrator can be driven by scripted output in tests.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

/// How a command's output is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Collect stdout/stderr for parsing
    Output,
    /// Stream to the user's terminal (package managers, installers)
    Inherit,
}

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub capture: Capture,
    /// Pass arguments without quoting (Windows `cmd /C` command lines)
    pub verbatim: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            capture: Capture::Output,
            verbatim: false,
        }
    }

    /// Convenience for programs addressed by path (venv tools)
    pub fn for_path(program: &Path) -> Self {
        Self::new(program.display().to_string())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn inherit(mut self) -> Self {
        self.capture = Capture::Inherit;
        self
    }

    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            if self.verbatim {
                write!(f, " {arg}")?;
            } else {
                write!(f, " {}", quote(arg))?;
            }
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{s}\"")
    } else {
        s.to_string()
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl CommandOutput {
    /// Human-readable exit status for error messages
    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status: {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands to completion
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// Spawns real processes, blocking until they exit
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        tracing::debug!(command = %invocation, "running");

        let mut command = Command::new(&invocation.program);
        add_args(&mut command, invocation);

        match invocation.capture {
            Capture::Output => {
                let output = command.stdin(Stdio::null()).output()?;
                Ok(CommandOutput {
                    code: output.status.code(),
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            Capture::Inherit => {
                let status = command.status()?;
                Ok(CommandOutput {
                    code: status.code(),
                    success: status.success(),
                    ..CommandOutput::default()
                })
            }
        }
    }
}

#[cfg(windows)]
fn add_args(command: &mut Command, invocation: &Invocation) {
    use std::os::windows::process::CommandExt;

    if invocation.verbatim {
        for arg in &invocation.args {
            command.raw_arg(arg);
        }
    } else {
        command.args(&invocation.args);
    }
}

#[cfg(not(windows))]
fn add_args(command: &mut Command, invocation: &Invocation) {
    command.args(&invocation.args);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_arguments_with_spaces() {
        let inv = Invocation::new("aqt")
            .args(["install-qt", "windows", "desktop"])
            .arg("-O")
            .arg(r"C:\Users\Jane Doe\Qt");
        assert_eq!(
            inv.to_string(),
            r#"aqt install-qt windows desktop -O "C:\Users\Jane Doe\Qt""#
        );
    }

    #[test]
    fn test_display_verbatim_keeps_arguments_raw() {
        let inv = Invocation::new("cmd")
            .arg("/C")
            .arg(r#"call "C:\VS\vcvarsall.bat" x64 && set"#)
            .verbatim();
        assert_eq!(
            inv.to_string(),
            r#"cmd /C call "C:\VS\vcvarsall.bat" x64 && set"#
        );
    }

    #[test]
    fn test_status_text() {
        assert_eq!(CommandOutput::failed(2, "").status_text(), "exit status: 2");
        let signalled = CommandOutput {
            code: None,
            ..CommandOutput::default()
        };
        assert_eq!(signalled.status_text(), "terminated by signal");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output_and_status() {
        let ok = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "echo hello; echo oops >&2"]))
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.stdout.trim(), "hello");
        assert_eq!(ok.stderr.trim(), "oops");

        let failed = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "exit 3"]))
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.code, Some(3));
    }

    #[test]
    fn test_system_runner_missing_program_is_spawn_error() {
        let result = SystemRunner.run(&Invocation::new("definitely-not-a-real-program-4711"));
        assert!(result.is_err());
    }
}
