//! Tracing subscriber setup.
//!
//! `--log` picks where output goes: `0`/`off`, `1`/`stdout`, `2`/`stderr`, or
//! a file path (appended to, without ANSI colors). `RUST_LOG` refines the
//! filter when set; otherwise the level is INFO, or DEBUG with `--verbose`.

use anyhow::Result;
use std::convert::Infallible;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    Off,
    Stdout,
    #[default]
    Stderr,
    File(PathBuf),
}

impl FromStr for LogTarget {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            path => LogTarget::File(PathBuf::from(path)),
        })
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Install the global subscriber for `target`.
pub fn init(target: &LogTarget, verbose: bool) -> Result<()> {
    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(verbose))
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(verbose))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(verbose))
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_named_targets() {
        assert_eq!("0".parse::<LogTarget>().unwrap(), LogTarget::Off);
        assert_eq!("off".parse::<LogTarget>().unwrap(), LogTarget::Off);
        assert_eq!("1".parse::<LogTarget>().unwrap(), LogTarget::Stdout);
        assert_eq!("stdout".parse::<LogTarget>().unwrap(), LogTarget::Stdout);
        assert_eq!("2".parse::<LogTarget>().unwrap(), LogTarget::Stderr);
        assert_eq!("stderr".parse::<LogTarget>().unwrap(), LogTarget::Stderr);
    }

    #[test]
    fn anything_else_is_a_file() {
        assert_eq!(
            "logs/deps.log".parse::<LogTarget>().unwrap(),
            LogTarget::File(PathBuf::from("logs/deps.log"))
        );
    }

    #[test]
    fn off_installs_nothing() {
        assert!(init(&LogTarget::Off, true).is_ok());
    }
}
