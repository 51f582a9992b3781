use anyhow::{Context, Result};
use std::path::Path;

use crate::config::BackendConfig;
use crate::context::ProvisionContext;
use crate::error::ExecError;
use crate::exec::{execute_attached, CommandSpec, Runner};
use crate::locate::module_name;

/// `module:app` target for the ASGI server.
pub fn app_target(entry_point: &Path, backend: &BackendConfig) -> Result<String> {
    let module = module_name(entry_point)
        .with_context(|| format!("cannot derive module name from {}", entry_point.display()))?;
    Ok(format!("{}:{}", module, backend.app_object))
}

pub fn server_command(
    ctx: &ProvisionContext,
    entry_point: &Path,
    backend: &BackendConfig,
) -> Result<CommandSpec> {
    let dir = entry_point
        .parent()
        .with_context(|| format!("{} has no parent directory", entry_point.display()))?;

    Ok(CommandSpec::new(ctx.venv_bin("uvicorn"))
        .arg(app_target(entry_point, backend)?)
        .args(["--host", backend.host.as_str()])
        .arg("--port")
        .arg(backend.port.to_string())
        .arg("--reload")
        .current_dir(dir))
}

/// Runs the dev server in the foreground until it exits.
/// Returns the server's exit code; `None` means it was stopped by a signal.
pub fn launch(
    runner: &dyn Runner,
    ctx: &ProvisionContext,
    entry_point: &Path,
    backend: &BackendConfig,
) -> Result<Option<i32>> {
    let cmd = server_command(ctx, entry_point, backend)?;
    tracing::info!(
        "launching uvicorn on {}:{} (reload enabled)",
        backend.host,
        backend.port
    );
    match execute_attached(runner, &cmd) {
        Ok(()) => Ok(Some(0)),
        Err(ExecError::Failed { code, .. }) => Ok(code),
        Err(e) => Err(e.into()),
    }
}
