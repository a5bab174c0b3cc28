//! LedgerProbe CLI
//!
//! ## Usage
//!
//! ```bash
//! ledgerprobe list                                  # Show scenarios
//! ledgerprobe run --all                             # Everything, in chromium
//! ledgerprobe run deposit withdrawal --headed       # Watch two scenarios
//! ledgerprobe run --all --backend mock --deployed   # Simulated demo, defects included
//! ledgerprobe config init ledgerprobe.yaml          # Write the default config
//! ```

use clap::Parser;
use ledgerprobe::ProbeConfig;
use ledgerprobe_cli::{
    init_logging, render_catalogue, Cli, CliError, CliResult, Commands, ConfigAction, ConfigArgs,
    ProgressReporter, RunArgs, Scenario, ScenarioRunner,
};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_verdict_failure() => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet, cli.log_format);

    match cli.command {
        Commands::Run(ref args) => run_scenarios(&cli, args),
        Commands::List => {
            print!("{}", render_catalogue(Scenario::all()));
            Ok(())
        }
        Commands::Config(ref args) => run_config(cli.config.as_deref(), args),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<ProbeConfig> {
    match path {
        Some(path) => ProbeConfig::load(path)
            .map_err(|e| CliError::config(path, e)),
        None => Ok(ProbeConfig::default()),
    }
}

fn run_scenarios(cli: &Cli, args: &RunArgs) -> CliResult<()> {
    let config = load_config(cli.config.as_deref())?;
    let runner = ScenarioRunner::new(config, args)?;
    let scenarios = args.selected();

    let mut reporter = ProgressReporter::new(std::io::stderr().is_terminal(), cli.quiet);
    reporter.header(&format!("ledgerprobe: {} scenario(s)", scenarios.len()));

    let runtime = tokio::runtime::Runtime::new()?;
    let summary = runtime.block_on(runner.run_all(&scenarios, &mut reporter))?;

    reporter.summary(
        summary.passed(),
        summary.failed(),
        std::time::Duration::from_millis(summary.duration_ms),
    );
    if let Some(path) = &args.json {
        summary.write_json(path)?;
        reporter.header(&format!("report written to {}", path.display()));
    }
    summary.into_result().map(|_| ())
}

fn run_config(path: Option<&Path>, args: &ConfigArgs) -> CliResult<()> {
    match &args.action {
        ConfigAction::Show => {
            let config = load_config(path)?.apply_env();
            print!("{}", config.to_yaml()?);
            Ok(())
        }
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                return Err(CliError::invalid_argument(format!(
                    "{} exists (use --force to overwrite)",
                    path.display()
                )));
            }
            std::fs::write(path, ProbeConfig::default().to_yaml()?)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
