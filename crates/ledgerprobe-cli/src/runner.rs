//! Scenario runner: one fresh session per scenario.

use crate::commands::{Backend, RunArgs};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::scenarios::{Scenario, ScenarioReport};
use ledgerprobe::mock::{BankBehavior, FakeBank};
use ledgerprobe::{launch, FakeClock, ProbeConfig, ProbeResult, Session};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Driver backend name
    pub backend: String,
    /// One report per scenario, in run order
    pub reports: Vec<ScenarioReport>,
    /// Wall-clock duration
    pub duration_ms: u64,
}

impl RunSummary {
    /// Scenarios that passed
    #[must_use]
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed).count()
    }

    /// Scenarios that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    /// Write the summary as pretty JSON
    pub fn write_json(&self, path: &Path) -> CliResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// `Ok` when every scenario passed
    pub fn into_result(self) -> CliResult<Self> {
        match self.failed() {
            0 => Ok(self),
            failed => Err(CliError::ScenariosFailed {
                failed,
                total: self.reports.len(),
            }),
        }
    }
}

/// Runs scenarios against the configured backend
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    config: ProbeConfig,
    backend: Backend,
    behavior: BankBehavior,
}

impl ScenarioRunner {
    /// Runner for `args`, with their overrides applied to `config`
    pub fn new(mut config: ProbeConfig, args: &RunArgs) -> CliResult<Self> {
        if args.deployed && args.backend != Backend::Mock {
            return Err(CliError::invalid_argument(
                "--deployed only applies to --backend mock",
            ));
        }
        if args.headed {
            config.browser.headless = false;
        }
        if let Some(dir) = &args.artifacts {
            config.artifacts_dir = Some(dir.clone());
        }
        // CI and LEDGERPROBE_HEADLESS win over --headed.
        let config = config.apply_env();
        config.validate()?;

        Ok(Self {
            config,
            backend: args.backend,
            behavior: if args.deployed {
                BankBehavior::as_deployed()
            } else {
                BankBehavior::faithful()
            },
        })
    }

    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    async fn open_session(&self) -> ProbeResult<Session> {
        let session = match self.backend {
            Backend::Mock => {
                let bank = FakeBank::with_profile(self.config.app.clone(), self.behavior);
                Session::with_clock(Box::new(bank.driver()), Arc::new(FakeClock::new()))
            }
            Backend::Browser => Session::new(launch(&self.config.browser).await?),
        };
        let session = session.with_timeouts(self.config.timeouts());
        Ok(match &self.config.artifacts_dir {
            Some(dir) => session.with_artifacts(dir),
            None => session,
        })
    }

    /// Run one scenario in a fresh session
    pub async fn run_one(&self, scenario: Scenario) -> CliResult<ScenarioReport> {
        let started = Instant::now();
        let mut session = self.open_session().await?;
        tracing::info!(%scenario, session = session.id(), "scenario started");

        let report = match scenario.run(&mut session, &self.config).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(%scenario, error = %e, "scenario aborted");
                ScenarioReport::errored(scenario, &e)
            }
        };
        if let Err(e) = session.close().await {
            tracing::warn!(%scenario, error = %e, "session close failed");
        }
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(report.with_duration_ms(elapsed))
    }

    /// Run `scenarios` in order, reporting as they finish.
    ///
    /// A scenario that errors is reported as failed. Only a session that
    /// cannot be opened at all aborts the run.
    pub async fn run_all(
        &self,
        scenarios: &[Scenario],
        reporter: &mut ProgressReporter,
    ) -> CliResult<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary {
            backend: match self.backend {
                Backend::Browser => "browser".to_string(),
                Backend::Mock => "mock".to_string(),
            },
            ..RunSummary::default()
        };

        reporter.start_progress(scenarios.len() as u64, "Running scenarios");
        for &scenario in scenarios {
            reporter.set_message(scenario.name());
            let report = self.run_one(scenario).await;
            let report = match report {
                Ok(report) => report,
                Err(e) => {
                    reporter.finish();
                    return Err(e);
                }
            };
            reporter.report(&report);
            reporter.increment(1);
            summary.reports.push(report);
        }
        reporter.finish();

        summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::commands::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["ledgerprobe", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_deployed_requires_mock() {
        let args = run_args(&["--all", "--deployed"]);
        let err = ScenarioRunner::new(ProbeConfig::default(), &args).unwrap_err();
        assert!(err.to_string().contains("--deployed"));
    }

    #[test]
    fn test_artifacts_flag_overrides_config() {
        let args = run_args(&["deposit", "--backend", "mock", "--artifacts", "shots"]);
        let runner = ScenarioRunner::new(ProbeConfig::default(), &args).unwrap();
        assert_eq!(runner.config().artifacts_dir.as_deref(), Some(Path::new("shots")));
    }

    #[test]
    fn test_faithful_mock_passes_everything() {
        let args = run_args(&["--all", "--backend", "mock"]);
        let runner = ScenarioRunner::new(ProbeConfig::default(), &args).unwrap();
        let mut reporter = ProgressReporter::new(false, true);

        let summary = runtime()
            .block_on(runner.run_all(&args.selected(), &mut reporter))
            .unwrap();
        assert_eq!(summary.reports.len(), 12);
        let failures: Vec<_> = summary.reports.iter().filter(|r| !r.passed).collect();
        assert!(failures.is_empty(), "{failures:#?}");
    }

    #[test]
    fn test_deployed_mock_surfaces_known_defects() {
        let args = run_args(&["--all", "--backend", "mock", "--deployed"]);
        let runner = ScenarioRunner::new(ProbeConfig::default(), &args).unwrap();
        let mut reporter = ProgressReporter::new(false, true);

        let summary = runtime()
            .block_on(runner.run_all(&args.selected(), &mut reporter))
            .unwrap();
        let failed: Vec<Scenario> = summary
            .reports
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.scenario)
            .collect();
        assert_eq!(
            failed,
            [
                Scenario::NumericName,
                Scenario::SpecialCharacters,
                Scenario::AlphabeticPostCode,
                Scenario::SessionTermination,
                Scenario::FilterReset,
            ]
        );
        assert!(summary.into_result().is_err());
    }

    #[test]
    fn test_json_report_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.json");
        let summary = RunSummary {
            backend: "mock".into(),
            reports: vec![ScenarioReport::new(Scenario::Deposit, true, "succeeded", "ok")],
            duration_ms: 5,
        };
        summary.write_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["reports"][0]["scenario"], "deposit");
        assert_eq!(json["backend"], "mock");
    }
}
