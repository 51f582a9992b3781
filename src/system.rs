use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;

use crate::error::ExecError;
use crate::exec::{execute, CommandSpec, Runner};

/// Builds commands that run with elevated privileges.
#[derive(Debug, Clone)]
pub struct Privilege {
    prefix: Option<String>,
}

impl Privilege {
    /// An empty `command` runs privileged steps as the current user.
    pub fn new(command: &str) -> Self {
        let command = command.trim();
        Self {
            prefix: (!command.is_empty()).then(|| command.to_string()),
        }
    }

    pub fn command<I, S>(&self, program: &str, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        match &self.prefix {
            Some(prefix) => CommandSpec::new(prefix).arg(program).args(args),
            None => CommandSpec::new(program).args(args),
        }
    }

    /// Like [`Privilege::command`], but keeps the caller's environment across `sudo`.
    pub fn command_keep_env<I, S>(&self, program: &str, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        match self.prefix.as_deref() {
            Some("sudo") => CommandSpec::new("sudo").arg("-E").arg(program).args(args),
            _ => self.command(program, args),
        }
    }
}

pub fn apt_update(runner: &dyn Runner, privilege: &Privilege) -> Result<(), ExecError> {
    execute(runner, &privilege.command("apt", ["update"])).map(drop)
}

pub fn apt_install(
    runner: &dyn Runner,
    privilege: &Privilege,
    packages: &[String],
) -> Result<(), ExecError> {
    let args = ["install", "-y"]
        .into_iter()
        .map(String::from)
        .chain(packages.iter().cloned());
    execute(runner, &privilege.command("apt", args)).map(drop)
}

pub fn systemctl(runner: &dyn Runner, privilege: &Privilege, args: &[&str]) -> Result<(), ExecError> {
    execute(runner, &privilege.command("systemctl", args.iter().copied())).map(drop)
}

/// Writes `contents` to a local temporary file and installs it at `dest`
/// (mode 0644) with elevated privileges. The temporary file is removed
/// afterwards whether or not the install succeeded.
pub fn install_file(
    runner: &dyn Runner,
    privilege: &Privilege,
    contents: &str,
    dest: &Path,
) -> Result<()> {
    let mut staged = tempfile::Builder::new()
        .prefix("stackup-")
        .tempfile()
        .context("failed to create staging file")?;
    staged
        .write_all(contents.as_bytes())
        .and_then(|_| staged.flush())
        .with_context(|| format!("failed to stage {}", dest.display()))?;

    let cmd = privilege.command(
        "install",
        [
            OsString::from("-m"),
            OsString::from("0644"),
            staged.path().as_os_str().to_owned(),
            dest.as_os_str().to_owned(),
        ],
    );
    execute(runner, &cmd)?;
    Ok(())
}
