//! Dialog interception protocol.
//!
//! State machine `NoDialog -> DialogPresent -> Resolved`. Entered after any
//! submit-style action. While a dialog is present the remote page ignores
//! every other command, so every [`Session`] action first checks this state
//! and fails with [`ProbeError::UnresolvedDialog`] instead of hanging.

use crate::poll::PollPolicy;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// An observed native dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogEvent {
    /// Dialog message
    pub text: String,
    /// Session clock reading when first seen
    pub observed_at_ms: u64,
}

/// How a dialog is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    /// OK
    Accept,
    /// Cancel
    Dismiss,
}

impl std::fmt::Display for DialogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Dismiss => write!(f, "dismiss"),
        }
    }
}

/// Dialog protocol state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogState {
    /// Nothing observed this turn
    NoDialog,
    /// A dialog is open and blocks the page
    DialogPresent(DialogEvent),
    /// The last dialog was resolved
    Resolved {
        /// Dialog that was resolved
        event: DialogEvent,
        /// Resolution applied
        action: DialogAction,
    },
}

impl DialogState {
    pub(crate) fn present(text: String, at: Duration) -> Self {
        Self::DialogPresent(DialogEvent {
            text,
            observed_at_ms: at.as_millis() as u64,
        })
    }

    /// Whether a dialog currently blocks the page
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self, Self::DialogPresent(_))
    }
}

/// A resolved dialog, kept in the session log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogRecord {
    /// Dialog message
    pub text: String,
    /// Resolution applied
    pub action: DialogAction,
    /// When it was first seen
    pub observed_at_ms: u64,
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Whether every keyword or any keyword must appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMatch {
    /// At least one keyword
    Any,
    /// Every keyword
    All,
}

/// Outcome class of a signal text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalClass {
    /// Text announces success
    Success,
    /// Anything else
    Rejection,
}

/// Classifies dialog or inline text against a success keyword set.
///
/// Matching is case-insensitive. Any text that does not match is a
/// rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeClassifier {
    /// Success keywords
    pub success_keywords: Vec<String>,
    /// Match mode
    pub mode: KeywordMatch,
}

impl OutcomeClassifier {
    /// Success if any keyword appears
    #[must_use]
    pub fn any<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            success_keywords: keywords.into_iter().map(Into::into).collect(),
            mode: KeywordMatch::Any,
        }
    }

    /// Success only if every keyword appears
    #[must_use]
    pub fn all<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            success_keywords: keywords.into_iter().map(Into::into).collect(),
            mode: KeywordMatch::All,
        }
    }

    /// Classify `text`
    #[must_use]
    pub fn classify(&self, text: &str) -> SignalClass {
        if self.success_keywords.is_empty() {
            return SignalClass::Rejection;
        }
        let text = text.to_lowercase();
        let mut hits = self
            .success_keywords
            .iter()
            .map(|k| text.contains(&k.to_lowercase()));
        let success = match self.mode {
            KeywordMatch::Any => hits.any(|h| h),
            KeywordMatch::All => hits.all(|h| h),
        };
        if success {
            SignalClass::Success
        } else {
            SignalClass::Rejection
        }
    }
}

// =============================================================================
// PROTOCOL
// =============================================================================

impl Session {
    /// Wait up to `timeout` for a native dialog.
    ///
    /// Absence is a valid answer (`Ok(None)`): some mutations report through
    /// inline markup instead.
    pub async fn poll_for_dialog(&mut self, timeout: Duration) -> ProbeResult<Option<DialogEvent>> {
        if let DialogState::DialogPresent(event) = &self.dialog {
            return Ok(Some(event.clone()));
        }

        let clock = Arc::clone(&self.clock);
        let mut poller =
            PollPolicy::timeout(timeout, self.timeouts.poll_interval).start(clock.as_ref());
        while poller.next_attempt().await {
            if let Some(text) = self.driver.dialog_text().await? {
                let event = DialogEvent {
                    text,
                    observed_at_ms: clock.elapsed().as_millis() as u64,
                };
                tracing::info!(
                    text = %event.text,
                    polls = poller.attempts(),
                    elapsed_ms = poller.elapsed().as_millis() as u64,
                    "dialog observed"
                );
                self.dialog = DialogState::DialogPresent(event.clone());
                return Ok(Some(event));
            }
        }

        tracing::debug!(
            timeout_ms = timeout.as_millis() as u64,
            polls = poller.attempts(),
            "no dialog"
        );
        Ok(None)
    }

    /// Text of the open dialog.
    ///
    /// # Errors
    ///
    /// [`ProbeError::InvalidState`] unless a dialog is present.
    pub fn read_dialog_text(&self) -> ProbeResult<String> {
        match &self.dialog {
            DialogState::DialogPresent(event) => Ok(event.text.clone()),
            other => Err(ProbeError::invalid_state(format!(
                "read_dialog_text called in state {}",
                state_name(other)
            ))),
        }
    }

    /// Accept or dismiss the open dialog.
    ///
    /// # Errors
    ///
    /// [`ProbeError::InvalidState`] unless a dialog is present.
    pub async fn resolve_dialog(&mut self, action: DialogAction) -> ProbeResult<DialogRecord> {
        let event = match &self.dialog {
            DialogState::DialogPresent(event) => event.clone(),
            other => {
                return Err(ProbeError::invalid_state(format!(
                    "resolve_dialog({action}) called in state {}",
                    state_name(other)
                )))
            }
        };

        match action {
            DialogAction::Accept => self.driver.accept_dialog().await?,
            DialogAction::Dismiss => self.driver.dismiss_dialog().await?,
        }
        tracing::debug!(text = %event.text, %action, "dialog resolved");

        let record = DialogRecord {
            text: event.text.clone(),
            action,
            observed_at_ms: event.observed_at_ms,
        };
        self.dialog_log.push(record.clone());
        self.dialog = DialogState::Resolved { event, action };
        Ok(record)
    }

    /// Current protocol state
    #[must_use]
    pub const fn dialog_state(&self) -> &DialogState {
        &self.dialog
    }

    /// Every dialog resolved in this session
    #[must_use]
    pub fn dialog_log(&self) -> &[DialogRecord] {
        &self.dialog_log
    }
}

const fn state_name(state: &DialogState) -> &'static str {
    match state {
        DialogState::NoDialog => "NoDialog",
        DialogState::DialogPresent(_) => "DialogPresent",
        DialogState::Resolved { .. } => "Resolved",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::locator::Locator;
    use crate::mock::{MockDriver, MockElement};

    fn session(driver: &MockDriver, clock: &FakeClock) -> Session {
        Session::with_clock(Box::new(driver.clone()), Arc::new(clock.clone()))
    }

    mod classifier_tests {
        use super::*;

        #[test]
        fn test_any_mode() {
            let c = OutcomeClassifier::any(["successfully", "added"]);
            assert_eq!(
                c.classify("Customer added successfully with customer id :6"),
                SignalClass::Success
            );
            assert_eq!(c.classify("Customer ADDED"), SignalClass::Success);
            assert_eq!(
                c.classify("Please check the details. Customer may be duplicate."),
                SignalClass::Rejection
            );
        }

        #[test]
        fn test_all_mode() {
            let c = OutcomeClassifier::all(["successfully", "account"]);
            assert_eq!(
                c.classify("Account created successfully with account Number :1016"),
                SignalClass::Success
            );
            assert_eq!(c.classify("Done successfully"), SignalClass::Rejection);
        }

        #[test]
        fn test_empty_keywords_never_succeed() {
            let c = OutcomeClassifier::any(Vec::<String>::new());
            assert_eq!(c.classify("successfully"), SignalClass::Rejection);
        }
    }

    mod protocol_tests {
        use super::*;

        #[tokio::test]
        async fn test_absent_dialog_is_none_after_timeout() {
            let driver = MockDriver::new();
            let clock = FakeClock::new();
            let mut s = session(&driver, &clock);

            let got = s.poll_for_dialog(Duration::from_secs(5)).await.unwrap();

            assert!(got.is_none());
            assert_eq!(clock.now(), Duration::from_secs(5));
            assert_eq!(s.dialog_state(), &DialogState::NoDialog);
        }

        #[tokio::test]
        async fn test_read_text_without_dialog_is_invalid_state() {
            let driver = MockDriver::new();
            let s = session(&driver, &FakeClock::new());
            let err = s.read_dialog_text().unwrap_err();
            assert!(matches!(err, ProbeError::InvalidState { .. }));
            assert!(!err.is_recoverable());
        }

        #[tokio::test]
        async fn test_full_cycle() {
            let driver = MockDriver::new();
            driver.open_dialog("Customer added successfully with customer id :6");
            let clock = FakeClock::new();
            let mut s = session(&driver, &clock);

            let event = s.poll_for_dialog(Duration::from_secs(5)).await.unwrap().unwrap();
            assert!(s.dialog_state().is_blocking());
            assert_eq!(s.read_dialog_text().unwrap(), event.text);

            let record = s.resolve_dialog(DialogAction::Accept).await.unwrap();
            assert_eq!(record.action, DialogAction::Accept);
            assert!(matches!(s.dialog_state(), DialogState::Resolved { .. }));
            assert_eq!(s.dialog_log().len(), 1);
            assert!(driver.was_called("accept_dialog"));
            assert!(driver.dialog().is_none());

            // A resolved dialog cannot be read or resolved again.
            assert!(s.read_dialog_text().is_err());
            assert!(s.resolve_dialog(DialogAction::Dismiss).await.is_err());
        }

        #[tokio::test]
        async fn test_unresolved_dialog_blocks_actions() {
            let driver = MockDriver::new();
            let button = Locator::id("submit");
            driver.add(MockElement::new(&button));
            driver.open_dialog("Please check the details.");
            let clock = FakeClock::new();
            let mut s = session(&driver, &clock);

            s.poll_for_dialog(Duration::from_secs(1)).await.unwrap();
            let err = s.click(&button).await.unwrap_err();
            assert!(matches!(err, ProbeError::UnresolvedDialog { .. }));

            s.resolve_dialog(DialogAction::Dismiss).await.unwrap();
            s.click(&button).await.unwrap();
            assert!(driver.was_called("dismiss_dialog"));
        }

        #[tokio::test]
        async fn test_dialog_raised_by_click_is_caught() {
            let driver = MockDriver::new();
            let button = Locator::id("submit");
            driver.add(MockElement::new(&button));
            driver.on_click(&button, |page| page.raise_dialog("Transaction done"));
            let clock = FakeClock::new();
            let mut s = session(&driver, &clock);

            s.click(&button).await.unwrap();
            let event = s.poll_for_dialog(Duration::from_secs(5)).await.unwrap();

            assert_eq!(event.unwrap().text, "Transaction done");
            assert_eq!(clock.sleep_count(), 0);
        }
    }
}
