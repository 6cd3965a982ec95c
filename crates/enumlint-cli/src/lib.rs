//! Command-line driver for enumlint.
//!
//! - `args` - clap argument definitions
//! - `config` - `enumlint.json` loading and flag merging
//! - `driver` - file discovery, parallel checking and `--fix`
//! - `reporter` - text and JSON output
//! - `tracing_config` - `ENUMLINT_LOG` subscriber setup

pub mod args;
pub mod config;
pub mod driver;
pub mod reporter;
pub mod tracing_config;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;
#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;
