use anyhow::{Context, Result};
use clap::Parser;

use stackup::cli::SetupCli;
use stackup::commands::{self, SetupInputs};
use stackup::{config, logging, paths};

fn main() {
    let cli = SetupCli::parse();
    logging::init(cli.common.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: SetupCli) -> Result<()> {
    let config = config::load(cli.common.config.as_deref())?;
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    let project_dir = match cli.common.project_dir {
        Some(dir) => paths::resolve_under(&cwd, &dir),
        None => cwd,
    };
    let user = paths::invoking_user()
        .context("could not determine the invoking user for the service unit")?;

    let inputs = SetupInputs {
        project_dir,
        user,
        dry_run: cli.common.dry_run,
    };

    let runner = stackup::runner(cli.common.dry_run);
    let result = commands::cmd_setup(runner.as_ref(), &inputs, &config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", commands::format_setup_human(&result));
    }
    Ok(())
}
