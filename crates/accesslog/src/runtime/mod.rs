//! Runtime module: boot, then stream stdin to stdout.

pub mod boot;
pub mod run;

pub use run::{run, RunError};
