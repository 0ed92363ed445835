//! Runtime support shared by the Staffdesk binaries: layered configuration,
//! logging setup and home directory resolution.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, CliArgs, ClientConfig, LoggingConfig, Section};
