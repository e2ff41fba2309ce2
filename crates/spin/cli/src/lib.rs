//! spinctl library: deployment configuration, operation scripts and the
//! replay runner behind the `spinctl` binary.

pub mod config;
pub mod error;
pub mod runner;
pub mod script;

pub use config::DeploymentConfig;
pub use error::{CliError, CliResult};
pub use runner::{Report, Runner};
pub use script::{Script, Step};
