//! LADA command-line interface
//!
//! Thin command layer over the model registry and the configuration store.

pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod router;

pub use error::{CliError, CliResult};
pub use router::{Cli, CommandRouter, Commands};
