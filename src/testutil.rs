#![cfg(test)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::ExecError;
use crate::exec::{CommandOutput, CommandSpec, Runner};

/// Records every command instead of running it. Commands whose display line
/// contains a configured pattern fail. `python3 -m venv <dir>` creates `<dir>`
/// so existence checks behave like the real tool.
#[derive(Default)]
pub struct FakeRunner {
    commands: RefCell<Vec<CommandSpec>>,
    attached: RefCell<Vec<bool>>,
    fail_on: Vec<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(pattern: &str) -> Self {
        Self {
            fail_on: vec![pattern.to_string()],
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.borrow().clone()
    }

    /// Display lines of every recorded command, in order.
    pub fn lines(&self) -> Vec<String> {
        self.commands.borrow().iter().map(|c| c.to_string()).collect()
    }

    pub fn attached_lines(&self) -> Vec<String> {
        self.commands
            .borrow()
            .iter()
            .zip(self.attached.borrow().iter())
            .filter(|(_, attached)| **attached)
            .map(|(c, _)| c.to_string())
            .collect()
    }

    pub fn ran(&self, fragment: &str) -> bool {
        self.lines().iter().any(|l| l.contains(fragment))
    }

    fn record(&self, cmd: &CommandSpec, attached: bool) -> Result<(), ExecError> {
        self.commands.borrow_mut().push(cmd.clone());
        self.attached.borrow_mut().push(attached);

        let line = cmd.to_string();
        if self.fail_on.iter().any(|p| line.contains(p.as_str())) {
            return Err(ExecError::Failed {
                command: line,
                code: Some(1),
                diagnostic: "simulated failure".to_string(),
            });
        }

        let argv = cmd.argv();
        if argv.len() == 4 && argv[0] == "python3" && argv[1] == "-m" && argv[2] == "venv" {
            std::fs::create_dir_all(&argv[3]).expect("failed to create fake venv");
        }
        Ok(())
    }
}

impl Runner for FakeRunner {
    fn capture(&self, cmd: &CommandSpec) -> Result<CommandOutput, ExecError> {
        self.record(cmd, false)?;
        Ok(CommandOutput::default())
    }

    fn attach(&self, cmd: &CommandSpec) -> Result<(), ExecError> {
        self.record(cmd, true)
    }
}

pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}
