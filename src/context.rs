use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::paths::resolve_under;

/// Paths one workflow run operates on. Built once, filled in as discovery
/// steps succeed.
#[derive(Debug, Clone)]
pub struct ProvisionContext {
    pub project_dir: PathBuf,
    pub venv_dir: PathBuf,
    pub manifest: PathBuf,
    pub entry_point: Option<PathBuf>,
}

impl ProvisionContext {
    pub fn new(project_dir: &Path, config: &Config) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            venv_dir: resolve_under(project_dir, &config.backend.venv_dir),
            manifest: resolve_under(project_dir, &config.backend.manifest),
            entry_point: None,
        }
    }

    /// An executable installed into the isolated environment.
    pub fn venv_bin(&self, name: &str) -> PathBuf {
        self.venv_dir.join("bin").join(name)
    }
}
