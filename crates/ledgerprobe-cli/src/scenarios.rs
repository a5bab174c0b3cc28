//! The XYZ Bank scenario catalogue.
//!
//! Each scenario drives one fresh [`Session`] and reduces whatever the
//! library returned to a [`ScenarioReport`].

use clap::ValueEnum;
use ledgerprobe::workflow::{
    AccountInput, CreateCustomer, CustomerDirectory, CustomerInput, OpenAccount, Portal,
    ResetFilters, SessionSecurityProbe, Transaction, TransactionInput, VerifySettings, Workflow,
};
use ledgerprobe::{
    FilterVerdict, ProbeConfig, ProbeResult, SecurityVerdict, Session, WorkflowOutcome,
};
use serde::Serialize;
use std::fmt;

/// Customer used by the login, transaction and security scenarios
pub const DEMO_CUSTOMER: &str = "Hermoine Granger";

/// Date filter values in the transactions view's `MM/DD/YYYY hh:mm` input format
const FILTER_RANGE: (&str, &str) = ("01/01/2015 12:00", "07/28/2015 12:00");

/// A named verification scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Well-formed customer is created and listed
    ValidCustomer,
    /// Digits in the name must be refused
    NumericName,
    /// Symbols in the name must be refused
    SpecialCharacters,
    /// Letters in the post code must be refused
    AlphabeticPostCode,
    /// Empty form must not create anything
    EmptyFields,
    /// Customers list renders, counts and filters
    CustomerList,
    /// Account is opened and its number listed
    OpenAccount,
    /// Seeded customer can log in
    CustomerLogin,
    /// Deposit is credited
    Deposit,
    /// Withdrawal is debited
    Withdrawal,
    /// Logout ends the session for history-back
    SessionTermination,
    /// Reset empties the transaction date filters
    FilterReset,
}

impl Scenario {
    /// Every scenario in catalogue order
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ValidCustomer,
            Self::NumericName,
            Self::SpecialCharacters,
            Self::AlphabeticPostCode,
            Self::EmptyFields,
            Self::CustomerList,
            Self::OpenAccount,
            Self::CustomerLogin,
            Self::Deposit,
            Self::Withdrawal,
            Self::SessionTermination,
            Self::FilterReset,
        ]
    }

    /// Command-line name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ValidCustomer => "valid-customer",
            Self::NumericName => "numeric-name",
            Self::SpecialCharacters => "special-characters",
            Self::AlphabeticPostCode => "alphabetic-post-code",
            Self::EmptyFields => "empty-fields",
            Self::CustomerList => "customer-list",
            Self::OpenAccount => "open-account",
            Self::CustomerLogin => "customer-login",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::SessionTermination => "session-termination",
            Self::FilterReset => "filter-reset",
        }
    }

    /// One-line description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ValidCustomer => "create Emmanuel Arhu (12345) and find the row",
            Self::NumericName => "create John123 Smith, expect refusal",
            Self::SpecialCharacters => "create John@#$ Smith!, expect refusal",
            Self::AlphabeticPostCode => "create John Smith (ABCDE), expect refusal",
            Self::EmptyFields => "submit an empty form, expect nothing created",
            Self::CustomerList => "list, count and search customers",
            Self::OpenAccount => "open a Dollar account for Harry Potter",
            Self::CustomerLogin => "log in as Hermoine Granger",
            Self::Deposit => "deposit 100 and find the credit",
            Self::Withdrawal => "deposit 200, withdraw 50, find the debit",
            Self::SessionTermination => "logout, history-back, dashboard must be gone",
            Self::FilterReset => "set date filters, reset, both must be empty",
        }
    }

    /// Drive this scenario on `session`
    pub async fn run(self, session: &mut Session, config: &ProbeConfig) -> ProbeResult<ScenarioReport> {
        let app = config.app.clone();
        let verify = VerifySettings::from_config(config);
        let create = |first: &str, last: &str, post: &str| CustomerInput::new(first, last, post);

        match self {
            Self::ValidCustomer => {
                let outcome = CreateCustomer::new(app)
                    .with_verification(verify)
                    .run(session, &create("Emmanuel", "Arhu", "12345"))
                    .await?;
                Ok(ScenarioReport::from_workflow(self, outcome))
            }
            Self::NumericName | Self::SpecialCharacters | Self::AlphabeticPostCode | Self::EmptyFields => {
                let input = match self {
                    Self::NumericName => create("John123", "Smith", "12345"),
                    Self::SpecialCharacters => create("John@#$", "Smith!", "12345"),
                    Self::AlphabeticPostCode => create("John", "Smith", "ABCDE"),
                    _ => create("", "", ""),
                };
                let outcome = CreateCustomer::new(app)
                    .with_verification(verify)
                    .run(session, &input)
                    .await?;
                Ok(ScenarioReport::from_workflow(self, outcome))
            }
            Self::CustomerList => {
                let directory = CustomerDirectory::new(app);
                let count = directory.count(session).await?;
                let found = directory.search(session, "Harry").await?;
                let filtered = !found.is_empty() && found.rows().iter().all(|r| r.contains("Harry"));
                let form = directory.form_displayed(session).await?;
                let passed = count > 0 && filtered && form;
                Ok(ScenarioReport::new(
                    self,
                    passed,
                    if passed { "listed" } else { "defect" },
                    format!(
                        "{count} customers, {} matching \"Harry\", add form {}",
                        found.len(),
                        if form { "shown" } else { "missing" }
                    ),
                ))
            }
            Self::OpenAccount => {
                let outcome = OpenAccount::new(app)
                    .with_verification(verify)
                    .run(session, &AccountInput::new("Harry Potter", "Dollar"))
                    .await?;
                Ok(ScenarioReport::from_workflow(self, outcome))
            }
            Self::CustomerLogin => {
                let portal = Portal::new(app);
                let welcome = portal.login_customer(session, DEMO_CUSTOMER).await?;
                let timeout = session.timeouts().element;
                let dashboard_shown = portal.dashboard_marker(session, timeout).await?.is_some();
                let passed = welcome.contains(DEMO_CUSTOMER) && dashboard_shown;
                Ok(ScenarioReport::new(
                    self,
                    passed,
                    if passed { "logged in" } else { "defect" },
                    format!("welcome banner {welcome:?}"),
                ))
            }
            Self::Deposit => {
                let outcome = Transaction::deposit(app)
                    .with_verification(verify)
                    .run(session, &TransactionInput::new(DEMO_CUSTOMER, 100))
                    .await?;
                Ok(ScenarioReport::from_workflow(self, outcome))
            }
            Self::Withdrawal => {
                let funded = Transaction::deposit(app.clone())
                    .with_verification(verify)
                    .run(session, &TransactionInput::new(DEMO_CUSTOMER, 200))
                    .await?;
                if !funded.verdict.passed() {
                    return Ok(ScenarioReport::from_workflow(self, funded));
                }
                let outcome = Transaction::withdrawal(app)
                    .with_verification(verify)
                    .run(session, &TransactionInput::new(DEMO_CUSTOMER, 50))
                    .await?;
                Ok(ScenarioReport::from_workflow(self, outcome))
            }
            Self::SessionTermination => {
                let outcome = SessionSecurityProbe::new(app).run(session, DEMO_CUSTOMER).await?;
                let passed = outcome.verdict == SecurityVerdict::Secure;
                let detail = match &outcome.marker_after_back {
                    Some(marker) => format!("dashboard still shows {marker:?} after logout + back"),
                    None => "dashboard unreachable after logout + back".to_string(),
                };
                Ok(ScenarioReport::new(
                    self,
                    passed,
                    if passed { "secure" } else { "defect" },
                    detail,
                )
                .with_outcome(&outcome))
            }
            Self::FilterReset => {
                let outcome = ResetFilters::new(app)
                    .run(session, DEMO_CUSTOMER, FILTER_RANGE.0, FILTER_RANGE.1)
                    .await?;
                let passed = outcome.verdict == FilterVerdict::Cleared;
                let detail = format!(
                    "after reset: start {:?}, end {:?}",
                    outcome.start_value, outcome.end_value
                );
                Ok(ScenarioReport::new(
                    self,
                    passed,
                    if passed { "cleared" } else { "defect" },
                    detail,
                )
                .with_outcome(&outcome))
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario run
    pub scenario: Scenario,
    /// Passed (succeeded, expected rejection, secure, cleared)
    pub passed: bool,
    /// Short verdict label
    pub verdict: String,
    /// Human-readable explanation
    pub detail: String,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// Structured library outcome, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<serde_json::Value>,
}

impl ScenarioReport {
    /// Report without a structured outcome
    #[must_use]
    pub fn new(
        scenario: Scenario,
        passed: bool,
        verdict: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            scenario,
            passed,
            verdict: verdict.into(),
            detail: detail.into(),
            duration_ms: 0,
            outcome: None,
        }
    }

    /// Report for a workflow outcome
    #[must_use]
    pub fn from_workflow(scenario: Scenario, outcome: WorkflowOutcome) -> Self {
        let mut detail = format!("{:?} vs expected {:?}", outcome.observation, outcome.expectation);
        if let Some(text) = outcome
            .evidence
            .dialog_text
            .as_ref()
            .or(outcome.evidence.inline_text.as_ref())
        {
            detail.push_str(&format!(", signal {text:?}"));
        }
        Self::new(
            scenario,
            outcome.verdict.passed(),
            outcome.verdict.to_string(),
            detail,
        )
        .with_outcome(&outcome)
    }

    /// Report for a scenario that errored before reaching a verdict
    #[must_use]
    pub fn errored(scenario: Scenario, error: &ledgerprobe::ProbeError) -> Self {
        Self::new(scenario, false, "error", error.to_string())
    }

    /// Attach a structured outcome
    #[must_use]
    pub fn with_outcome(mut self, outcome: &impl Serialize) -> Self {
        self.outcome = serde_json::to_value(outcome).ok();
        self
    }

    /// Set the duration
    #[must_use]
    pub const fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}
