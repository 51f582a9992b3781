use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Backend project directory
    #[arg(long)]
    pub project_dir: Option<PathBuf>,
    /// Config file (default: the platform config dir's stackup/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "stackup-launch",
    version,
    about = "Create the virtualenv, install dependencies and run the dev server"
)]
pub struct LaunchCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
#[command(
    name = "stackup-setup",
    version,
    about = "Provision the backend service, frontend build and nginx site on this host"
)]
pub struct SetupCli {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Print the completion summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clis_are_well_formed() {
        LaunchCli::command().debug_assert();
        SetupCli::command().debug_assert();
    }

    #[test]
    fn zero_args_parse() {
        let cli = LaunchCli::try_parse_from(["stackup-launch"]).unwrap();
        assert!(cli.common.project_dir.is_none());
        assert!(!cli.common.dry_run);

        let cli = SetupCli::try_parse_from(["stackup-setup"]).unwrap();
        assert!(!cli.json);
    }

    #[test]
    fn flags_parse() {
        let cli = SetupCli::try_parse_from([
            "stackup-setup",
            "--project-dir",
            "/srv/app",
            "--dry-run",
            "-v",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.common.project_dir, Some(PathBuf::from("/srv/app")));
        assert!(cli.common.dry_run);
        assert!(cli.common.verbose);
        assert!(cli.json);
    }

    #[test]
    fn launcher_rejects_json() {
        assert!(LaunchCli::try_parse_from(["stackup-launch", "--json"]).is_err());
    }
}
