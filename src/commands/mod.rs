//! Workflows return result structs instead of printing their summaries;
//! the binaries format them as human-readable text or JSON.
mod launch;
mod setup;

pub use launch::*;
pub use setup::*;
