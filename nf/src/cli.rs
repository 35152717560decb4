//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::sim::embedded;

/// navflow - coordinator navigation simulator
#[derive(Parser)]
#[command(
    name = "nf",
    about = "Run navigation scenarios against the navflow coordinator engine",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a scenario file
    Run {
        /// Scenario file (YAML)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Parse and validate a scenario file without running it
    Check {
        /// Scenario file (YAML)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Run an embedded demo scenario, or list them
    Demo {
        /// Demo name; omit to list the available demos
        name: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("navflow")
        .join("logs")
        .join("navflow.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with the demo list and log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Demos:\n");
    for name in embedded::NAMES {
        help.push_str(&format!("  {}\n", name));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for run reports
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["nf", "run", "flow.yml"]);
        match cli.command {
            Command::Run { file, format } => {
                assert_eq!(file, PathBuf::from("flow.yml"));
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_run_json() {
        let cli = Cli::parse_from(["nf", "run", "flow.yml", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Command::Run {
                format: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::parse_from(["nf", "check", "flow.yml"]);
        assert!(matches!(cli.command, Command::Check { .. }));
    }

    #[test]
    fn test_cli_parse_demo_without_name() {
        let cli = Cli::parse_from(["nf", "demo"]);
        assert!(matches!(cli.command, Command::Demo { name: None, .. }));
    }

    #[test]
    fn test_cli_parse_global_options() {
        let cli = Cli::parse_from(["nf", "demo", "swipe-back", "-l", "debug", "--config", "nf.yml"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("nf.yml")));
        assert!(matches!(cli.command, Command::Demo { name: Some(ref n), .. } if n == "swipe-back"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_after_help_lists_demos() {
        let help = generate_after_help();
        for name in embedded::NAMES {
            assert!(help.contains(name));
        }
        assert!(help.contains("navflow.log"));
    }
}
