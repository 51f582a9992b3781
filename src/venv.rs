use anyhow::{Context, Result};
use std::path::Path;

use crate::context::ProvisionContext;
use crate::error::ExecError;
use crate::exec::{execute, CommandSpec, Runner};

const PYTHON: &str = "python3";

/// Creates the isolated environment unless it already exists.
/// Returns whether a creation command was issued.
pub fn ensure_environment(runner: &dyn Runner, ctx: &ProvisionContext) -> Result<bool, ExecError> {
    if ctx.venv_dir.exists() {
        tracing::debug!("environment present at {}", ctx.venv_dir.display());
        return Ok(false);
    }

    tracing::info!(
        "virtual environment not found, creating {}",
        ctx.venv_dir.display()
    );
    let cmd = CommandSpec::new(PYTHON)
        .args(["-m", "venv"])
        .arg(&ctx.venv_dir);
    execute(runner, &cmd)?;
    Ok(true)
}

pub fn upgrade_pip(runner: &dyn Runner, ctx: &ProvisionContext) -> Result<(), ExecError> {
    let cmd = CommandSpec::new(ctx.venv_bin("pip")).args(["install", "--upgrade", "pip"]);
    execute(runner, &cmd).map(drop)
}

/// Writes a manifest listing `packages` if none exists. Returns whether it wrote one.
pub fn ensure_manifest(path: &Path, packages: &[String]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    let mut content = packages.join("\n");
    content.push('\n');
    std::fs::write(path, content)
        .with_context(|| format!("failed to write default manifest to {}", path.display()))?;
    tracing::info!(
        "{} not found, wrote a default with {} packages",
        path.display(),
        packages.len()
    );
    Ok(true)
}

/// Installs every package listed in the manifest into the environment.
pub fn install_dependencies(runner: &dyn Runner, ctx: &ProvisionContext) -> Result<(), ExecError> {
    let cmd = CommandSpec::new(ctx.venv_bin("pip"))
        .args(["install", "-r"])
        .arg(&ctx.manifest);
    execute(runner, &cmd).map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testutil::{FakeRunner, TestProject};

    #[test]
    fn ensure_environment_creates_when_missing() {
        let project = TestProject::new();
        let ctx = ProvisionContext::new(project.path(), &Config::default());
        let runner = FakeRunner::new();

        assert!(ensure_environment(&runner, &ctx).unwrap());
        let lines = runner.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("python3 -m venv "));
        assert!(lines[0].ends_with("/venv"));
    }

    #[test]
    fn ensure_environment_is_idempotent() {
        let project = TestProject::new();
        let ctx = ProvisionContext::new(project.path(), &Config::default());
        let runner = FakeRunner::new();

        assert!(ensure_environment(&runner, &ctx).unwrap());
        assert!(!ensure_environment(&runner, &ctx).unwrap());
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn ensure_environment_surfaces_failure() {
        let project = TestProject::new();
        let ctx = ProvisionContext::new(project.path(), &Config::default());
        let runner = FakeRunner::failing_on("-m venv");

        let err = ensure_environment(&runner, &ctx).unwrap_err();
        assert_eq!(err.diagnostic(), "simulated failure");
    }

    #[test]
    fn ensure_manifest_writes_default_packages() {
        let project = TestProject::new();
        let path = project.path().join("requirements.txt");
        let packages = vec!["fastapi".to_string(), "uvicorn[standard]".to_string()];

        assert!(ensure_manifest(&path, &packages).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "fastapi\nuvicorn[standard]\n");
    }

    #[test]
    fn ensure_manifest_keeps_existing() {
        let project = TestProject::new();
        let path = project.write("requirements.txt", "httpx\n");

        assert!(!ensure_manifest(&path, &["fastapi".to_string()]).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "httpx\n");
    }

    #[test]
    fn install_uses_environment_pip() {
        let project = TestProject::new();
        let ctx = ProvisionContext::new(project.path(), &Config::default());
        let runner = FakeRunner::new();

        install_dependencies(&runner, &ctx).unwrap();
        let argv = runner.commands()[0].argv();
        assert_eq!(argv[0], ctx.venv_bin("pip").to_string_lossy());
        assert_eq!(argv[1..3], ["install", "-r"]);
        assert_eq!(argv[3], ctx.manifest.to_string_lossy());
    }
}
