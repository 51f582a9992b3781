use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ExecError;

/// A fully resolved program invocation. Executed directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(OsString, OsString)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program and arguments as display strings.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd
    }
}

/// Renders the command the way an operator would type it. Display only.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self
            .argv()
            .iter()
            .map(|a| quote_arg(a))
            .collect::<Vec<_>>()
            .join(" ");
        match &self.cwd {
            Some(dir) => write!(f, "(cd {} && {})", quote_arg(&dir.to_string_lossy()), line),
            None => f.write_str(&line),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Port for running external programs.
pub trait Runner {
    /// Runs to completion with stdout/stderr piped back to the caller.
    fn capture(&self, cmd: &CommandSpec) -> Result<CommandOutput, ExecError>;

    /// Runs to completion with the terminal attached (inherited stdio).
    fn attach(&self, cmd: &CommandSpec) -> Result<(), ExecError>;
}

pub struct SystemRunner;

impl Runner for SystemRunner {
    fn capture(&self, cmd: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let output = cmd
            .to_command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ExecError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ExecError::Failed {
                command: cmd.to_string(),
                code: output.status.code(),
                diagnostic: diagnostic_text(&stdout, &stderr),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }

    fn attach(&self, cmd: &CommandSpec) -> Result<(), ExecError> {
        let status = cmd
            .to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ExecError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(ExecError::Failed {
                command: cmd.to_string(),
                code: status.code(),
                diagnostic: "(output was streamed to the terminal)".to_string(),
            });
        }
        Ok(())
    }
}

/// Echoes commands without running them.
pub struct DryRunner;

impl Runner for DryRunner {
    fn capture(&self, _cmd: &CommandSpec) -> Result<CommandOutput, ExecError> {
        Ok(CommandOutput::default())
    }

    fn attach(&self, _cmd: &CommandSpec) -> Result<(), ExecError> {
        Ok(())
    }
}

/// Echoes `cmd`, runs it with captured output, and logs what it printed.
/// Returns stdout with trailing whitespace trimmed.
pub fn execute(runner: &dyn Runner, cmd: &CommandSpec) -> Result<String, ExecError> {
    tracing::info!("$ {}", cmd);
    match runner.capture(cmd) {
        Ok(output) => {
            for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
                tracing::info!("  {}", line);
            }
            for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
                tracing::debug!("  {}", line);
            }
            Ok(output.stdout.trim_end().to_string())
        }
        Err(e) => {
            tracing::error!("{}", e);
            Err(e)
        }
    }
}

/// Echoes `cmd` and runs it attached to the terminal. Blocks until it exits.
pub fn execute_attached(runner: &dyn Runner, cmd: &CommandSpec) -> Result<(), ExecError> {
    tracing::info!("$ {}", cmd);
    runner.attach(cmd)
}

/// Prefers stderr; falls back to stdout for tools that report errors there.
fn diagnostic_text(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    stdout.trim().to_string()
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_metacharacters() {
        let cmd = CommandSpec::new("pip").args(["install", "uvicorn[standard]"]);
        assert_eq!(cmd.to_string(), "pip install 'uvicorn[standard]'");
    }

    #[test]
    fn display_shows_working_directory() {
        let cmd = CommandSpec::new("npm")
            .args(["run", "build"])
            .current_dir("/srv/my app/frontend");
        assert_eq!(cmd.to_string(), "(cd '/srv/my app/frontend' && npm run build)");
    }

    #[test]
    fn display_escapes_single_quotes() {
        let cmd = CommandSpec::new("echo").arg("it's");
        assert_eq!(cmd.to_string(), "echo 'it'\\''s'");
    }

    #[test]
    fn argv_includes_program_first() {
        let cmd = CommandSpec::new("systemctl").args(["enable", "fastapi-backend"]);
        assert_eq!(cmd.argv(), vec!["systemctl", "enable", "fastapi-backend"]);
    }

    #[test]
    fn execute_returns_trimmed_stdout() {
        let cmd = CommandSpec::new("echo").arg("hello");
        let out = execute(&SystemRunner, &cmd).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn execute_runs_in_working_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = CommandSpec::new("pwd").current_dir(tmp.path());
        let out = execute(&SystemRunner, &cmd).unwrap();
        let expected = tmp.path().canonicalize().unwrap();
        assert_eq!(std::path::PathBuf::from(out).canonicalize().unwrap(), expected);
    }

    #[test]
    fn execute_applies_environment_overlay() {
        let cmd = CommandSpec::new("sh")
            .args(["-c", "printf %s \"$STACKUP_PROBE\""])
            .env("STACKUP_PROBE", "overlay");
        assert_eq!(execute(&SystemRunner, &cmd).unwrap(), "overlay");
    }

    #[test]
    fn execute_failure_carries_stderr() {
        let cmd = CommandSpec::new("sh").args(["-c", "echo boom >&2; exit 3"]);
        let err = execute(&SystemRunner, &cmd).unwrap_err();
        match err {
            ExecError::Failed {
                code, diagnostic, ..
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(diagnostic, "boom");
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn execute_failure_falls_back_to_stdout() {
        let cmd = CommandSpec::new("sh").args(["-c", "echo only-stdout; exit 1"]);
        let err = execute(&SystemRunner, &cmd).unwrap_err();
        assert_eq!(err.diagnostic(), "only-stdout");
    }

    #[test]
    fn execute_missing_program_is_spawn_error() {
        let cmd = CommandSpec::new("stackup-definitely-not-a-real-program");
        let err = execute(&SystemRunner, &cmd).unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[test]
    fn attach_reports_exit_code() {
        let cmd = CommandSpec::new("sh").args(["-c", "exit 2"]);
        let err = execute_attached(&SystemRunner, &cmd).unwrap_err();
        assert!(matches!(err, ExecError::Failed { code: Some(2), .. }));
    }

    #[test]
    fn dry_runner_never_spawns() {
        let cmd = CommandSpec::new("stackup-definitely-not-a-real-program");
        assert_eq!(execute(&DryRunner, &cmd).unwrap(), "");
        assert!(execute_attached(&DryRunner, &cmd).is_ok());
    }
}
