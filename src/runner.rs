use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured output of a finished process
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Trimmed stderr, suitable for reports
    pub fn stderr_trimmed(&self) -> String {
        self.stderr.trim().to_string()
    }
}

/// Run a command and capture output
pub fn run_captured(cmd: &str, args: &[&str], cwd: Option<&Path>) -> io::Result<CommandOutput> {
    let mut command = Command::new(cmd);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command.output()?;
    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run a shell snippet via `sh -c`, capturing output
pub fn run_shell(script: &str, cwd: Option<&Path>) -> io::Result<CommandOutput> {
    run_captured("sh", &["-c", script], cwd)
}

/// Run a command silently, returning success/failure
pub fn run_quiet(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run a shell predicate silently; true means it exited 0
pub fn check_shell(script: &str, cwd: Option<&Path>) -> bool {
    let mut command = Command::new("sh");
    command
        .args(["-c", script])
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    command.status().map(|s| s.success()).unwrap_or(false)
}
