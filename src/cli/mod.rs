//! Command-line interface.

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::logging::LogTarget;

/// Task dependency graph service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Address to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP API (default if no subcommand given)
    Serve,

    /// Scan stored dependencies for cycles and exit non-zero if one is found
    Check,
}

impl Cli {
    pub fn log_target(&self) -> LogTarget {
        match self.log.parse() {
            Ok(target) => target,
            Err(never) => match never {},
        }
    }

    /// Apply command-line overrides on top of loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref db_path) = self.database {
            config.server.db_path = db_path.into();
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
