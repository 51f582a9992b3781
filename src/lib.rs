pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod frontend;
pub mod launch;
pub mod locate;
pub mod logging;
pub mod paths;
pub mod proxy;
pub mod service;
pub mod system;
pub mod venv;

mod testutil;

use exec::{DryRunner, Runner, SystemRunner};

pub fn runner(dry_run: bool) -> Box<dyn Runner> {
    if dry_run {
        Box::new(DryRunner)
    } else {
        Box::new(SystemRunner)
    }
}
