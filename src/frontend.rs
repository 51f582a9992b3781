use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::FrontendConfig;
use crate::exec::{execute, execute_attached, CommandSpec, Runner};
use crate::system::{apt_install, Privilege};

/// Installs Node.js from the NodeSource repository. The setup script is
/// downloaded to a temporary file and run from there instead of piped into
/// a shell.
pub fn install_node(runner: &dyn Runner, privilege: &Privilege, setup_url: &str) -> Result<()> {
    let script = tempfile::Builder::new()
        .prefix("stackup-nodesource-")
        .suffix(".sh")
        .tempfile()
        .context("failed to create temporary file for the NodeSource script")?;

    let download = CommandSpec::new("curl")
        .arg("-fsSL")
        .arg("-o")
        .arg(script.path())
        .arg(setup_url);
    execute(runner, &download)?;

    // NodeSource's script reads proxy settings from the caller's environment.
    let run = privilege.command_keep_env("bash", [script.path().as_os_str().to_owned()]);
    execute(runner, &run)?;

    apt_install(runner, privilege, &["nodejs".to_string()])?;
    Ok(())
}

/// Scaffolds the frontend if absent, then installs packages and builds.
/// Returns the static build output directory.
pub fn build_frontend(
    runner: &dyn Runner,
    project_dir: &Path,
    frontend: &FrontendConfig,
) -> Result<PathBuf> {
    let dir = project_dir.join(&frontend.dir);

    if !dir.exists() {
        tracing::info!("{} not found, scaffolding a Vue app", dir.display());
        let scaffold = CommandSpec::new("npx")
            .arg("create-vue@latest")
            .arg(&frontend.dir)
            .current_dir(project_dir);
        execute_attached(runner, &scaffold)?;
    }

    execute(runner, &CommandSpec::new("npm").arg("install").current_dir(&dir))?;
    execute(
        runner,
        &CommandSpec::new("npm").args(["run", "build"]).current_dir(&dir),
    )?;

    Ok(dir.join(&frontend.build_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeRunner, TestProject};

    #[test]
    fn node_install_downloads_then_runs_script() {
        let runner = FakeRunner::new();
        install_node(
            &runner,
            &Privilege::new("sudo"),
            "https://deb.nodesource.com/setup_18.x",
        )
        .unwrap();

        let cmds = runner.commands();
        assert_eq!(cmds.len(), 3);

        let download = cmds[0].argv();
        assert_eq!(download[..3], ["curl", "-fsSL", "-o"]);
        assert_eq!(download[4], "https://deb.nodesource.com/setup_18.x");

        let run = cmds[1].argv();
        assert_eq!(run[..3], ["sudo", "-E", "bash"]);
        assert_eq!(run[3], download[3]);

        assert_eq!(cmds[2].to_string(), "sudo apt install -y nodejs");
    }

    #[test]
    fn node_install_without_privilege_skips_env_flag() {
        let runner = FakeRunner::new();
        install_node(&runner, &Privilege::new(""), "https://example.test/setup").unwrap();
        assert_eq!(runner.commands()[1].argv()[0], "bash");
    }

    #[test]
    fn failed_download_stops_node_install() {
        let runner = FakeRunner::failing_on("curl");
        assert!(install_node(&runner, &Privilege::new("sudo"), "https://x.test").is_err());
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn missing_frontend_is_scaffolded_attached() {
        let project = TestProject::new();
        let runner = FakeRunner::new();
        let out = build_frontend(&runner, project.path(), &FrontendConfig::default()).unwrap();

        assert_eq!(out, project.path().join("frontend").join("dist"));
        let attached = runner.attached_lines();
        assert_eq!(attached.len(), 1);
        assert!(attached[0].contains("npx create-vue@latest frontend"));

        let cmds = runner.commands();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0].cwd.as_deref(), Some(project.path()));
        assert_eq!(cmds[1].argv(), vec!["npm", "install"]);
        assert_eq!(cmds[2].argv(), vec!["npm", "run", "build"]);
        assert_eq!(cmds[2].cwd, Some(project.path().join("frontend")));
    }

    #[test]
    fn existing_frontend_is_not_scaffolded() {
        let project = TestProject::new();
        project.mkdir("frontend");
        let runner = FakeRunner::new();
        build_frontend(&runner, project.path(), &FrontendConfig::default()).unwrap();

        assert!(!runner.ran("create-vue"));
        assert_eq!(runner.commands().len(), 2);
    }
}
