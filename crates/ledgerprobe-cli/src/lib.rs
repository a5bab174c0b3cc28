//! LedgerProbe CLI Library
//!
//! Command-line front end over the `ledgerprobe` engine: scenario
//! catalogue, runner, terminal reporting and logging setup.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod error;
mod logging;
mod output;
mod runner;
mod scenarios;

pub use commands::{Backend, Cli, Commands, ConfigAction, ConfigArgs, LogFormat, RunArgs};
pub use error::{CliError, CliResult};
pub use logging::{init_logging, log_filter};
pub use output::{render_catalogue, ProgressReporter};
pub use runner::{RunSummary, ScenarioRunner};
pub use scenarios::{Scenario, ScenarioReport, DEMO_CUSTOMER};
