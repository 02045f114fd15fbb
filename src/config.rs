//! Server configuration from command-line flags and `PR_REVIEWER_*`
//! environment variables.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Pull request reviewer assignment service.
#[derive(Parser, Debug, Clone)]
#[command(name = "pr-reviewer", version, about)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "PR_REVIEWER_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// Path to the SQLite database file
    #[arg(long, env = "PR_REVIEWER_DATABASE", default_value = "pr-reviewer.db")]
    pub database: PathBuf,

    /// Per-request deadline in seconds
    #[arg(long, env = "PR_REVIEWER_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds
    #[arg(long, env = "PR_REVIEWER_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("request timeout"));
        }
        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("shutdown timeout"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
