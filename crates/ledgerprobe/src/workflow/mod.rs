//! Workflow orchestrator.
//!
//! Every business operation follows the same strictly sequential shape:
//!
//! ```text
//! perform ──► poll dialog ──┬─ dialog ──► classify ─► accept ──┐
//!                           └─ none ────► inline signal? ──────┤
//!                                                              ▼
//!             success / silent ──► cross-view verify ──► observation ──► verdict
//!             rejection ─────────────────────────────────► observation ──► verdict
//! ```
//!
//! Concrete workflows only choose the actions, the signal vocabulary and
//! the verification query. [`execute`] owns the ordering.

mod account;
mod customer;
mod navigation;
mod security;
mod transaction;

pub use account::{extract_identifier, AccountInput, OpenAccount};
pub use customer::{CreateCustomer, CustomerDirectory, CustomerInput};
pub use navigation::Portal;
pub use security::SessionSecurityProbe;
pub use transaction::{ResetFilters, Transaction, TransactionInput, TransactionKind};

use crate::config::ProbeConfig;
use crate::dialog::{DialogAction, OutcomeClassifier, SignalClass};
use crate::locator::Locator;
use crate::outcome::{Evidence, Expectation, Observation, RejectionSignal, WorkflowOutcome};
use crate::poll::PollPolicy;
use crate::result::ProbeResult;
use crate::session::Session;
use crate::verify::Verification;
use crate::wait::WaitCondition;
use async_trait::async_trait;
use std::time::Duration;

// =============================================================================
// SIGNALS
// =============================================================================

/// How an inline signal is read when no dialog appears
#[derive(Debug, Clone)]
pub enum InlineMode {
    /// The element showing up at all means rejection
    RejectOnPresence,
    /// The element's text is classified
    Classify(OutcomeClassifier),
}

/// Inline fallback signal
#[derive(Debug, Clone)]
pub struct InlineSignal {
    /// Element carrying the signal
    pub locator: Locator,
    /// How to read it
    pub mode: InlineMode,
}

/// How a workflow's submission reports its outcome
#[derive(Debug, Clone)]
pub struct Submission {
    /// Dialog probe timeout
    pub dialog_timeout: Duration,
    /// Classifier for dialog text
    pub classifier: OutcomeClassifier,
    /// Fallback when no dialog appears
    pub inline: Option<InlineSignal>,
}

/// Signal observed after the submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A dialog appeared (already accepted)
    Dialog {
        /// Dialog text
        text: String,
        /// Classification
        class: SignalClass,
    },
    /// Inline markup or message
    Inline {
        /// Element text
        text: String,
        /// Classification
        class: SignalClass,
    },
    /// Nothing observable
    Silent,
}

impl Signal {
    /// Classification, `None` when silent
    #[must_use]
    pub const fn class(&self) -> Option<SignalClass> {
        match self {
            Self::Dialog { class, .. } | Self::Inline { class, .. } => Some(*class),
            Self::Silent => None,
        }
    }
}

// =============================================================================
// VERIFICATION SETTINGS
// =============================================================================

/// Attempts and spacing for cross-view verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifySettings {
    /// Fetches at most
    pub attempts: u32,
    /// Pause between fetches
    pub interval: Duration,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            interval: Duration::from_secs(1),
        }
    }
}

impl VerifySettings {
    /// Settings from configuration
    #[must_use]
    pub const fn from_config(config: &ProbeConfig) -> Self {
        Self {
            attempts: config.verification_attempts,
            interval: config.verification_interval(),
        }
    }

    /// Poll policy for the verifier
    #[must_use]
    pub fn policy(&self) -> PollPolicy {
        PollPolicy::attempts(self.attempts, self.interval)
    }
}

// =============================================================================
// WORKFLOW TRAIT
// =============================================================================

/// A named multi-step business operation
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Caller-supplied input
    type Input: Send + Sync;

    /// Stable name used in logs and reports
    fn name(&self) -> &'static str;

    /// Whether the application should accept `input`
    fn expectation(&self, input: &Self::Input) -> Expectation;

    /// How the submission reports its outcome
    fn submission(&self, session: &Session) -> Submission;

    /// Drive the mutation up to and including the submit
    async fn perform(
        &self,
        session: &mut Session,
        input: &Self::Input,
        evidence: &mut Evidence,
    ) -> ProbeResult<()>;

    /// Pull extra facts out of the signal (e.g. an identifier)
    fn annotate(&self, _signal: &Signal, _evidence: &mut Evidence) {}

    /// Read the mutation back through an independent view
    async fn verify(
        &self,
        session: &mut Session,
        input: &Self::Input,
        evidence: &mut Evidence,
    ) -> ProbeResult<Verification>;

    /// Run the whole workflow
    async fn run(&self, session: &mut Session, input: &Self::Input) -> ProbeResult<WorkflowOutcome> {
        execute(self, session, input).await
    }
}

/// Drive `workflow` through the orchestrator sequence.
///
/// Expected rejections come back as verdicts. Only setup failures (a
/// control that never became ready, a dialog left open) are errors.
pub async fn execute<W>(
    workflow: &W,
    session: &mut Session,
    input: &W::Input,
) -> ProbeResult<WorkflowOutcome>
where
    W: Workflow + ?Sized,
{
    let name = workflow.name();
    let expectation = workflow.expectation(input);
    let submission = workflow.submission(session);
    let mut evidence = Evidence::default();
    tracing::info!(workflow = name, session = session.id(), ?expectation, "workflow started");

    workflow.perform(session, input, &mut evidence).await?;

    let signal = read_signal(session, &submission, &mut evidence).await?;
    tracing::debug!(workflow = name, ?signal, "signal read");
    let label = format!("{name}-signal");
    evidence.snapshots.push(session.snapshot(&label).await);
    workflow.annotate(&signal, &mut evidence);

    let observation = match signal.class() {
        Some(SignalClass::Rejection) => Observation::Rejected {
            signal: if matches!(signal, Signal::Dialog { .. }) {
                RejectionSignal::Dialog
            } else {
                RejectionSignal::InlineIndicator
            },
        },
        claimed => {
            let verification = workflow.verify(session, input, &mut evidence).await?;
            match (verification, claimed) {
                (Verification::Matched { row, .. }, _) => {
                    evidence.matched_row = Some(row.clone());
                    Observation::Accepted { matched_row: row }
                }
                (Verification::Stale { row, .. }, claimed) => {
                    evidence.note(format!("only a pre-existing row matched: {row}"));
                    if claimed == Some(SignalClass::Success) {
                        Observation::ClaimedButUnobserved
                    } else {
                        Observation::Rejected {
                            signal: RejectionSignal::Silent,
                        }
                    }
                }
                (Verification::Exhausted { .. }, Some(SignalClass::Success)) => {
                    Observation::ClaimedButUnobserved
                }
                (Verification::Exhausted { .. }, _) => Observation::Rejected {
                    signal: RejectionSignal::Silent,
                },
            }
        }
    };

    let label = format!("{name}-final");
    evidence.snapshots.push(session.snapshot(&label).await);
    let outcome = WorkflowOutcome::new(name, expectation, observation, evidence);

    if outcome.verdict.passed() {
        tracing::info!(workflow = name, verdict = %outcome.verdict, "workflow finished");
    } else {
        tracing::warn!(
            workflow = name,
            verdict = %outcome.verdict,
            observation = ?outcome.observation,
            dialog = ?outcome.evidence.dialog_text,
            "workflow defect"
        );
    }
    Ok(outcome)
}

/// Dialog first, inline fallback second. The order matters: the page
/// ignores inline reads while a dialog is open.
async fn read_signal(
    session: &mut Session,
    submission: &Submission,
    evidence: &mut Evidence,
) -> ProbeResult<Signal> {
    if let Some(event) = session.poll_for_dialog(submission.dialog_timeout).await? {
        let class = submission.classifier.classify(&event.text);
        evidence.dialog_text = Some(event.text.clone());
        session.resolve_dialog(DialogAction::Accept).await?;
        return Ok(Signal::Dialog {
            text: event.text,
            class,
        });
    }

    let Some(inline) = &submission.inline else {
        return Ok(Signal::Silent);
    };
    let settle = session.timeouts().inline_settle;
    if session
        .probe(&inline.locator, WaitCondition::Visible, settle)
        .await?
        .is_none()
    {
        return Ok(Signal::Silent);
    }

    let text = session.read_text(&inline.locator).await?;
    evidence.inline_text = Some(text.clone());
    let class = match &inline.mode {
        InlineMode::RejectOnPresence => SignalClass::Rejection,
        InlineMode::Classify(classifier) => classifier.classify(&text),
    };
    Ok(Signal::Inline { text, class })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::mock::{MockDriver, MockElement};
    use crate::outcome::Verdict;
    use crate::verify::{CrossViewVerifier, ListView, VerificationQuery};
    use std::sync::Arc;

    /// Clicks a button; rows and signals are scripted on the mock.
    struct Scripted {
        submit: Locator,
        inline: Option<InlineSignal>,
        expect: Expectation,
    }

    fn view() -> ListView {
        ListView::new(vec![], Locator::id("list"), Locator::css("li"))
    }

    #[async_trait]
    impl Workflow for Scripted {
        type Input = String;

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn expectation(&self, _input: &String) -> Expectation {
            self.expect
        }

        fn submission(&self, session: &Session) -> Submission {
            Submission {
                dialog_timeout: session.timeouts().dialog,
                classifier: OutcomeClassifier::any(["successfully", "added"]),
                inline: self.inline.clone(),
            }
        }

        async fn perform(&self, session: &mut Session, _input: &String, _e: &mut Evidence) -> ProbeResult<()> {
            session.click(&self.submit).await
        }

        async fn verify(&self, session: &mut Session, input: &String, _e: &mut Evidence) -> ProbeResult<Verification> {
            CrossViewVerifier::new(view())
                .verify_with(session, &VerificationQuery::contains_all([input.clone()]), PollPolicy::attempts(2, Duration::from_secs(1)))
                .await
        }
    }

    fn setup(expect: Expectation) -> (MockDriver, FakeClock, Session, Scripted) {
        let driver = MockDriver::new();
        let submit = Locator::id("submit");
        driver.add(MockElement::new(&submit));
        driver.add(MockElement::new(&Locator::id("list")));
        let clock = FakeClock::new();
        let session = Session::with_clock(Box::new(driver.clone()), Arc::new(clock.clone()));
        let wf = Scripted {
            submit,
            inline: Some(InlineSignal {
                locator: Locator::id("err"),
                mode: InlineMode::RejectOnPresence,
            }),
            expect,
        };
        (driver, clock, session, wf)
    }

    #[tokio::test]
    async fn test_success_dialog_needs_row() {
        let (driver, _clock, mut s, wf) = setup(Expectation::Accept);
        driver.on_click(&wf.submit, |page| {
            page.raise_dialog("Customer added successfully");
            page.insert(MockElement::new(&Locator::css("li")).with_text("Emmanuel Arhu"));
        });

        let outcome = wf.run(&mut s, &"Emmanuel".to_string()).await.unwrap();

        assert_eq!(outcome.verdict, Verdict::Succeeded);
        assert_eq!(outcome.evidence.dialog_text.as_deref(), Some("Customer added successfully"));
        assert_eq!(outcome.evidence.matched_row.as_deref(), Some("Emmanuel Arhu"));
        assert_eq!(outcome.evidence.snapshots.len(), 2);
    }

    #[tokio::test]
    async fn test_success_dialog_without_row_is_defect() {
        let (driver, _clock, mut s, wf) = setup(Expectation::Accept);
        driver.on_click(&wf.submit, |page| page.raise_dialog("Customer added successfully"));

        let outcome = wf.run(&mut s, &"Ghost".to_string()).await.unwrap();

        assert_eq!(outcome.observation, Observation::ClaimedButUnobserved);
        assert_eq!(outcome.verdict, Verdict::Defect);
    }

    #[tokio::test]
    async fn test_rejection_dialog_skips_verification() {
        let (driver, _clock, mut s, wf) = setup(Expectation::Reject);
        driver.on_click(&wf.submit, |page| page.raise_dialog("Please check the details."));

        let outcome = wf.run(&mut s, &"x".to_string()).await.unwrap();

        assert_eq!(outcome.verdict, Verdict::ExpectedRejection);
        assert_eq!(driver.lookups(&Locator::css("li")), 0);
        assert!(driver.dialog().is_none());
    }

    #[tokio::test]
    async fn test_inline_indicator_is_rejection() {
        let (driver, clock, mut s, wf) = setup(Expectation::Reject);
        driver.on_click(&wf.submit, |page| {
            page.insert(MockElement::new(&Locator::id("err")).with_text("invalid"));
        });

        let outcome = wf.run(&mut s, &"x".to_string()).await.unwrap();

        assert_eq!(
            outcome.observation,
            Observation::Rejected { signal: RejectionSignal::InlineIndicator }
        );
        assert_eq!(outcome.evidence.inline_text.as_deref(), Some("invalid"));
        // Full dialog timeout elapsed before the inline fallback.
        assert!(clock.now() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_silent_success_resolved_by_verification() {
        let (driver, _clock, mut s, wf) = setup(Expectation::Accept);
        driver.on_click(&wf.submit, |page| {
            page.insert(MockElement::new(&Locator::css("li")).with_text("quiet row"));
        });

        let outcome = wf.run(&mut s, &"quiet".to_string()).await.unwrap();

        assert_eq!(outcome.verdict, Verdict::Succeeded);
        assert!(outcome.evidence.dialog_text.is_none());
    }

    #[tokio::test]
    async fn test_silent_nothing_is_silent_rejection() {
        let (_driver, _clock, mut s, wf) = setup(Expectation::Reject);

        let outcome = wf.run(&mut s, &"nothing".to_string()).await.unwrap();

        assert_eq!(outcome.observation, Observation::Rejected { signal: RejectionSignal::Silent });
        assert_eq!(outcome.verdict, Verdict::ExpectedRejection);
    }

    #[tokio::test]
    async fn test_missing_submit_is_fatal_error() {
        let (driver, _clock, mut s, wf) = setup(Expectation::Accept);
        driver.remove(&wf.submit);

        let err = wf.run(&mut s, &"x".to_string()).await.unwrap_err();

        assert!(matches!(err, crate::ProbeError::ElementNotReady { .. }));
    }
}
