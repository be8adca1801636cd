//! Command-line interface for the UHC development host.
//!
//! Flags override the matching values from the configuration file.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// Every field except `config_path` is an override: `None` (or `false`) leaves the
/// value from the configuration file untouched.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the tick interval
    pub tick_interval_ms: Option<u64>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses command line arguments using clap.
    ///
    /// Sets up the command-line interface with all available options and returns a
    /// structured representation of the parsed arguments. `--config` defaults to
    /// `uhc.toml` in the working directory.
    ///
    /// # Returns
    ///
    /// A `CliArgs` instance containing all parsed command-line options.
    ///
    /// # Exits
    ///
    /// clap prints usage and terminates the process on `--help`, `--version` and on
    /// malformed values such as a non-numeric `--tick-interval`.
    pub fn parse() -> Self {
        let matches = Command::new("UHC Host")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Runs the UHC plugin against an in-memory world with an admin console")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("uhc.toml"),
            )
            .arg(
                Arg::new("tick-interval")
                    .short('t')
                    .long("tick-interval")
                    .value_name("MS")
                    .help("Milliseconds between two game ticks")
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .get_matches();

        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uhc.toml")),
            tick_interval_ms: matches.get_one::<u64>("tick-interval").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}
