//! Small helpers shared across the workspace crates.

pub mod env;
pub mod toml_file;
