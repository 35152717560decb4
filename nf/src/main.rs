//! nf - navflow scenario runner
//!
//! CLI entry point for running and checking navigation scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use navflow::cli::{Cli, Command, OutputFormat, generate_after_help};
use navflow::config::Config;
use navflow::sim::{RunReport, Scenario, Simulator, embedded};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("navflow")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("navflow.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run { file, format } => {
            debug!(?file, %format, "main: matched Run command");
            cmd_run(&config, &file, &format)
        }
        Command::Check { file } => {
            debug!(?file, "main: matched Check command");
            cmd_check(&file)
        }
        Command::Demo { name, format } => {
            debug!(?name, %format, "main: matched Demo command");
            cmd_demo(&config, name.as_deref(), &format)
        }
    }
}

/// Run a scenario file and print its report
fn cmd_run(config: &Config, file: &Path, format: &OutputFormat) -> Result<()> {
    debug!(?file, "cmd_run: called");
    let scenario = Scenario::load(file)?;
    run_and_print(config, &scenario, format)
}

/// Validate a scenario file without running it
fn cmd_check(file: &Path) -> Result<()> {
    debug!(?file, "cmd_check: called");
    let scenario = Scenario::load(file)?;
    scenario
        .validate()
        .context(format!("Scenario {} is invalid", file.display()))?;

    println!(
        "{} {} ({} steps)",
        "✓".green(),
        scenario.name.cyan(),
        scenario.steps.len()
    );
    Ok(())
}

/// Run an embedded demo, or list the demos
fn cmd_demo(config: &Config, name: Option<&str>, format: &OutputFormat) -> Result<()> {
    debug!(?name, "cmd_demo: called");
    let Some(name) = name else {
        println!("Available demos:");
        for name in embedded::NAMES {
            if let Some(content) = embedded::get_embedded(name)
                && let Ok(scenario) = Scenario::from_yaml(content)
            {
                println!("  {:<14} {}", name.cyan(), scenario.description);
            }
        }
        return Ok(());
    };

    let content = embedded::get_embedded(name).ok_or_else(|| {
        eyre::eyre!(
            "Unknown demo: {}. Available: {}",
            name,
            embedded::NAMES.join(", ")
        )
    })?;
    let scenario = Scenario::from_yaml(content)?;
    run_and_print(config, &scenario, format)
}

fn run_and_print(config: &Config, scenario: &Scenario, format: &OutputFormat) -> Result<()> {
    let report = Simulator::new(config).run(scenario)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_report(&report),
    }

    match report.first_error() {
        Some(err) => Err(eyre::eyre!(
            "{} ({} of {} expectations failed)",
            err,
            report.failures.len(),
            report.expectations
        )),
        None => Ok(()),
    }
}

fn print_report(report: &RunReport) {
    println!("{} {}", "Scenario:".bold(), report.scenario.cyan());
    if !report.description.is_empty() {
        println!("  {}", report.description.dimmed());
    }
    println!();

    for step in &report.steps {
        let failed = report.failures.iter().any(|f| f.step == step.number);
        let marker = if failed { "✗".red() } else { "✓".green() };
        println!(
            "{} {:>3} {:<16} [{}] stack={:?} modals={:?} host={:?}",
            marker,
            step.number,
            step.op,
            step.flow.yellow(),
            step.stack,
            step.modals,
            step.host_stack
        );
    }

    for failure in &report.failures {
        println!("  {} step {}: {}", "FAIL".red().bold(), failure.step, failure.message);
    }

    println!();
    for (flow, count) in &report.finish_counts {
        println!("  {} finished {} time(s)", flow.cyan(), count);
    }

    let summary = format!(
        "{} expectations, {} failed, {} transitions",
        report.expectations,
        report.failures.len(),
        report.transitions.len()
    );
    if report.passed() {
        println!("{} {}", "PASSED".green().bold(), summary);
    } else {
        println!("{} {}", "FAILED".red().bold(), summary);
    }
}
