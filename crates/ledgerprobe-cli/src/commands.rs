//! CLI command definitions using clap

use crate::scenarios::Scenario;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// LedgerProbe: verify XYZ Bank workflows end to end
#[derive(Parser, Debug)]
#[command(name = "ledgerprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(long, global = true, env = "LEDGERPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and the summary)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run verification scenarios
    Run(RunArgs),

    /// List available scenarios
    List,

    /// Show or create configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenarios to run
    #[arg(value_enum, required_unless_present = "all")]
    pub scenarios: Vec<Scenario>,

    /// Run every scenario
    #[arg(long, conflicts_with = "scenarios")]
    pub all: bool,

    /// Where the UI is driven
    #[arg(long, value_enum, default_value = "browser")]
    pub backend: Backend,

    /// Simulate the bank as deployed, defects included (mock backend only)
    #[arg(long)]
    pub deployed: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for screenshots
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Write a JSON report to this file
    #[arg(long)]
    pub json: Option<PathBuf>,
}

impl RunArgs {
    /// Scenarios selected, in run order, without duplicates
    #[must_use]
    pub fn selected(&self) -> Vec<Scenario> {
        if self.all {
            return Scenario::all().to_vec();
        }
        let mut selected = Vec::new();
        for scenario in &self.scenarios {
            if !selected.contains(scenario) {
                selected.push(*scenario);
            }
        }
        selected
    }
}

/// Driver backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Chromium over CDP
    Browser,
    /// In-memory simulated bank
    Mock,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config action
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as YAML
    Show,

    /// Write the default configuration to a file
    Init {
        /// Destination file
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
