use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::context::ProvisionContext;
use crate::exec::Runner;
use crate::frontend::{build_frontend, install_node};
use crate::proxy::configure_proxy;
use crate::service::register_service;
use crate::system::{apt_install, apt_update, Privilege};
use crate::venv::{ensure_environment, ensure_manifest, install_dependencies, upgrade_pip};

pub const STEP_COUNT: usize = 6;

pub struct SetupInputs {
    pub project_dir: PathBuf,
    /// Account the backend service runs as.
    pub user: String,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct SetupResult {
    pub project_dir: PathBuf,
    pub completed_steps: Vec<String>,
    pub unit_path: PathBuf,
    pub site_path: PathBuf,
    pub static_root: PathBuf,
    pub backend_url: String,
    pub frontend_url: String,
}

struct Progress {
    completed: Vec<String>,
}

impl Progress {
    fn begin(&self, title: &str) {
        eprintln!("\n[{}/{}] {}...", self.completed.len() + 1, STEP_COUNT, title);
    }

    fn done(&mut self, title: &str) {
        self.completed.push(title.to_string());
    }
}

/// Full provisioning. Steps run in order and the first error aborts the rest;
/// nothing already applied is rolled back. Every step checks before acting,
/// so the workflow can be re-run after fixing whatever failed.
pub fn cmd_setup(runner: &dyn Runner, inputs: &SetupInputs, config: &Config) -> Result<SetupResult> {
    let privilege = Privilege::new(&config.system.privilege_command);
    let ctx = ProvisionContext::new(&inputs.project_dir, config);
    let mut progress = Progress {
        completed: Vec::new(),
    };

    let title = "Setting up Python environment";
    progress.begin(title);
    apt_update(runner, &privilege)
        .and_then(|_| apt_install(runner, &privilege, &config.system.packages))
        .context("Python environment setup failed")?;
    progress.done(title);

    let title = "Setting up virtual environment and installing dependencies";
    progress.begin(title);
    ensure_environment(runner, &ctx).context("failed to create virtual environment")?;
    upgrade_pip(runner, &ctx).context("failed to upgrade pip")?;
    if inputs.dry_run {
        if !ctx.manifest.exists() {
            tracing::info!("would write default manifest to {}", ctx.manifest.display());
        }
    } else {
        ensure_manifest(&ctx.manifest, &config.backend.default_packages)?;
    }
    install_dependencies(runner, &ctx).context("failed to install dependencies")?;
    progress.done(title);

    let title = "Configuring backend as a systemd service";
    progress.begin(title);
    let unit_path = register_service(
        runner,
        &privilege,
        &ctx,
        &config.backend,
        &config.service,
        &inputs.user,
    )
    .context("failed to register backend service")?;
    progress.done(title);

    let title = "Setting up Vue.js frontend";
    progress.begin(title);
    install_node(runner, &privilege, &config.frontend.node_setup_url)
        .context("failed to install Node.js")?;
    let static_root = build_frontend(runner, &ctx.project_dir, &config.frontend)
        .context("failed to build frontend")?;
    progress.done(title);

    let title = "Configuring Nginx to serve frontend and reverse-proxy backend";
    progress.begin(title);
    let site = configure_proxy(
        runner,
        &privilege,
        &config.proxy,
        &static_root,
        config.backend.port,
    )
    .context("failed to configure nginx")?;
    progress.done(title);

    Ok(SetupResult {
        project_dir: ctx.project_dir,
        completed_steps: progress.completed,
        unit_path,
        site_path: site.available,
        static_root,
        backend_url: format!("http://<server-ip>:{}", config.backend.port),
        frontend_url: match config.proxy.listen_port {
            80 => "http://<server-ip>".to_string(),
            port => format!("http://<server-ip>:{}", port),
        },
    })
}

pub fn format_setup_human(result: &SetupResult) -> String {
    [
        format!("\n[{}/{}] All steps completed successfully!", STEP_COUNT, STEP_COUNT),
        format!("Your backend is running on {}", result.backend_url),
        format!("Your frontend is accessible at {}", result.frontend_url),
    ]
    .join("\n")
}
