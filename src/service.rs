use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::{BackendConfig, ServiceConfig};
use crate::context::ProvisionContext;
use crate::exec::Runner;
use crate::locate::module_name;
use crate::system::{install_file, systemctl, Privilege};

pub struct UnitParams<'a> {
    pub description: &'a str,
    pub user: &'a str,
    pub ctx: &'a ProvisionContext,
    pub module: &'a str,
    pub backend: &'a BackendConfig,
}

pub fn render_unit(p: &UnitParams<'_>) -> String {
    format!(
        "[Unit]
Description={description}
After=network.target

[Service]
User={user}
WorkingDirectory={workdir}
ExecStart={uvicorn} {module}:{app} --host {host} --port {port}
Restart=always

[Install]
WantedBy=multi-user.target
",
        description = p.description,
        user = p.user,
        workdir = p.ctx.project_dir.display(),
        uvicorn = p.ctx.venv_bin("uvicorn").display(),
        module = p.module,
        app = p.backend.app_object,
        host = p.backend.host,
        port = p.backend.port,
    )
}

pub fn unit_path(service: &ServiceConfig) -> PathBuf {
    service.unit_dir.join(format!("{}.service", service.name))
}

/// Installs the backend unit and (re)starts it under the supervisor.
pub fn register_service(
    runner: &dyn Runner,
    privilege: &Privilege,
    ctx: &ProvisionContext,
    backend: &BackendConfig,
    service: &ServiceConfig,
    user: &str,
) -> Result<PathBuf> {
    let module = module_name(std::path::Path::new(&backend.entry_file))
        .with_context(|| format!("invalid entry file name {:?}", backend.entry_file))?;

    let unit = render_unit(&UnitParams {
        description: &service.description,
        user,
        ctx,
        module: &module,
        backend,
    });
    let path = unit_path(service);
    install_file(runner, privilege, &unit, &path)?;

    systemctl(runner, privilege, &["daemon-reload"])?;
    systemctl(runner, privilege, &["enable", service.name.as_str()])?;
    systemctl(runner, privilege, &["restart", service.name.as_str()])?;
    Ok(path)
}
