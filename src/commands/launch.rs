use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::context::ProvisionContext;
use crate::error::PreconditionMissing;
use crate::exec::Runner;
use crate::launch::{app_target, launch};
use crate::locate::find_entry_point;
use crate::venv::{ensure_environment, install_dependencies};

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LaunchResult {
    Launched {
        entry_point: PathBuf,
        target: String,
        exit_code: Option<i32>,
    },
    EntryPointMissing {
        project_dir: PathBuf,
        entry_file: String,
    },
}

/// Dev launcher: environment, dependencies, entry point, server.
///
/// Everything before the entry-point search is best-effort: failures are
/// logged and the run continues. A missing entry point ends the run without
/// launching anything.
pub fn cmd_launch(runner: &dyn Runner, project_dir: &Path, config: &Config) -> Result<LaunchResult> {
    let mut ctx = ProvisionContext::new(project_dir, config);

    if let Err(e) = ensure_environment(runner, &ctx) {
        tracing::warn!("could not create virtual environment, continuing: {}", e.diagnostic());
    }

    tracing::info!("installing dependencies");
    if ctx.manifest.exists() {
        if let Err(e) = install_dependencies(runner, &ctx) {
            tracing::warn!("dependency install failed, continuing: {}", e.diagnostic());
        }
    } else {
        let missing = PreconditionMissing {
            what: "dependency manifest",
            path: ctx.manifest.clone(),
        };
        tracing::warn!("{}; skipping dependency install", missing);
    }

    tracing::info!("searching for {}", config.backend.entry_file);
    let found = find_entry_point(
        &ctx.project_dir,
        &config.backend.entry_file,
        std::slice::from_ref(&ctx.venv_dir),
        config.backend.max_search_depth,
    );
    let Some(entry_point) = found else {
        return Ok(LaunchResult::EntryPointMissing {
            project_dir: ctx.project_dir,
            entry_file: config.backend.entry_file.clone(),
        });
    };
    ctx.entry_point = Some(entry_point.clone());

    let target = app_target(&entry_point, &config.backend)?;
    let exit_code = launch(runner, &ctx, &entry_point, &config.backend)?;

    Ok(LaunchResult::Launched {
        entry_point,
        target,
        exit_code,
    })
}

pub fn format_launch_human(result: &LaunchResult) -> String {
    match result {
        LaunchResult::Launched {
            target, exit_code, ..
        } => match exit_code {
            Some(0) => format!("Server {} exited.", target),
            Some(code) => format!("Server {} exited with code {}.", target, code),
            None => format!("Server {} stopped by signal.", target),
        },
        LaunchResult::EntryPointMissing {
            project_dir,
            entry_file,
        } => format!(
            "{} is missing under {}. Please create the file and try again.",
            entry_file,
            project_dir.display()
        ),
    }
}
