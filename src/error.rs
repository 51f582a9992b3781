use std::path::PathBuf;
use thiserror::Error;

/// An external command could not be run, or ran and exited non-zero.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed (exit code: {})\n{diagnostic}", exit_code_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        diagnostic: String,
    },
}

impl ExecError {
    pub fn diagnostic(&self) -> String {
        match self {
            ExecError::Spawn { source, .. } => source.to_string(),
            ExecError::Failed { diagnostic, .. } => diagnostic.clone(),
        }
    }
}

/// A file or directory the workflow depends on is absent.
#[derive(Error, Debug)]
#[error("{what} not found at {}", .path.display())]
pub struct PreconditionMissing {
    pub what: &'static str,
    pub path: PathBuf,
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map_or("signal".to_string(), |c| c.to_string())
}
