use anyhow::{Context, Result};
use clap::Parser;

use stackup::cli::LaunchCli;
use stackup::commands::{self, LaunchResult};
use stackup::{config, logging, paths};

fn main() {
    let cli = LaunchCli::parse();
    logging::init(cli.common.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns false when there was nothing to launch.
fn run(cli: LaunchCli) -> Result<bool> {
    let config = config::load(cli.common.config.as_deref())?;
    let project_dir = match cli.common.project_dir {
        Some(dir) => {
            let cwd = std::env::current_dir().context("could not determine current directory")?;
            paths::resolve_under(&cwd, &dir)
        }
        None => config.backend.project_dir.clone(),
    };

    let runner = stackup::runner(cli.common.dry_run);
    let result = commands::cmd_launch(runner.as_ref(), &project_dir, &config)?;
    println!("{}", commands::format_launch_human(&result));

    Ok(matches!(result, LaunchResult::Launched { .. }))
}
