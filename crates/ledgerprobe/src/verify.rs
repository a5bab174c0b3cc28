//! Cross-view verification engine.
//!
//! Confirms a mutation by reading it back through an independent list view.
//! The verifier opens the view once, then re-fetches a fresh [`RowSet`] on
//! every poll until a row matches or the attempts run out. It only clicks
//! navigation controls and never writes to the application.

use crate::locator::Locator;
use crate::poll::PollPolicy;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::WaitCondition;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// QUERY AND ROWS
// =============================================================================

/// Attributes that must all appear in one row
#[derive(Debug, Clone)]
pub struct VerificationQuery {
    required: Vec<String>,
    pattern: Option<Regex>,
}

impl VerificationQuery {
    /// Row must contain every one of `required`; empty strings are dropped
    #[must_use]
    pub fn contains_all<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
            pattern: None,
        }
    }

    /// A query with nothing to match would accept any row
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        self.required.is_empty() && self.pattern.is_none()
    }

    /// Additionally require a regex match somewhere in the row
    #[must_use]
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Required substrings
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Whether `row` satisfies the query
    #[must_use]
    pub fn matches(&self, row: &str) -> bool {
        self.required.iter().all(|needle| row.contains(needle.as_str()))
            && self.pattern.as_ref().map_or(true, |re| re.is_match(row))
    }
}

impl fmt::Display for VerificationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.required)?;
        if let Some(re) = &self.pattern {
            write!(f, " ~ /{}/", re.as_str())?;
        }
        Ok(())
    }
}

/// Rows read from a list view at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSet {
    rows: Vec<String>,
}

impl RowSet {
    /// Wrap fetched rows
    #[must_use]
    pub fn new(rows: Vec<String>) -> Self {
        Self { rows }
    }

    /// Rows in document order
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were rendered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row matching `query`
    #[must_use]
    pub fn find(&self, query: &VerificationQuery) -> Option<&str> {
        self.rows
            .iter()
            .map(String::as_str)
            .find(|row| query.matches(row))
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// How to reach and read an independent list view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
    /// Clicked in order to open the view
    pub open: Vec<Locator>,
    /// Waited for (visible) before the first fetch
    pub ready: Locator,
    /// One element per entity row
    pub rows: Locator,
    /// Clicked after verification to leave the view
    #[serde(default)]
    pub exit: Option<Locator>,
}

impl ListView {
    /// A view opened by clicking `open`
    #[must_use]
    pub fn new(open: Vec<Locator>, ready: Locator, rows: Locator) -> Self {
        Self {
            open,
            ready,
            rows,
            exit: None,
        }
    }

    /// Leave the view through `exit` afterwards
    #[must_use]
    pub fn with_exit(mut self, exit: Locator) -> Self {
        self.exit = Some(exit);
        self
    }
}

/// Result of a verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verification {
    /// A row matched
    Matched {
        /// Matching row text
        row: String,
        /// Fetch that found it, starting at 1
        attempts: u32,
    },
    /// A row matched, but other evidence shows it predates the mutation
    Stale {
        /// Row that matched
        row: String,
        /// Fetch that found it, starting at 1
        attempts: u32,
    },
    /// No row matched in any fetch
    Exhausted {
        /// Fetches performed
        attempts: u32,
        /// Row count of the final fetch
        last_row_count: usize,
    },
}

impl Verification {
    /// Whether a row matched
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Matching row, if any
    #[must_use]
    pub fn row(&self) -> Option<&str> {
        match self {
            Self::Matched { row, .. } => Some(row),
            Self::Stale { .. } | Self::Exhausted { .. } => None,
        }
    }

    /// Fetches performed
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Matched { attempts, .. }
            | Self::Stale { attempts, .. }
            | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Demote a match to [`Verification::Stale`]
    #[must_use]
    pub fn into_stale(self) -> Self {
        match self {
            Self::Matched { row, attempts } => Self::Stale { row, attempts },
            other => other,
        }
    }

    /// Turn anything but a fresh match into [`ProbeError::VerificationExhausted`]
    pub fn into_result(self, query: &VerificationQuery) -> ProbeResult<String> {
        match self {
            Self::Matched { row, .. } => Ok(row),
            Self::Stale { attempts, .. } | Self::Exhausted { attempts, .. } => {
                Err(ProbeError::VerificationExhausted {
                    query: query.to_string(),
                    attempts,
                })
            }
        }
    }
}

// =============================================================================
// VERIFIER
// =============================================================================

/// Read-and-compare oracle over one [`ListView`]
#[derive(Debug, Clone)]
pub struct CrossViewVerifier {
    view: ListView,
}

impl CrossViewVerifier {
    /// Verifier for `view`
    #[must_use]
    pub const fn new(view: ListView) -> Self {
        Self { view }
    }

    /// View being read
    #[must_use]
    pub const fn view(&self) -> &ListView {
        &self.view
    }

    /// `true` once a row contains every required attribute.
    ///
    /// `max_attempts` fetches at most, `poll_interval` apart. An attempt
    /// count of one means exactly one fetch.
    pub async fn verify(
        &self,
        session: &mut Session,
        query: &VerificationQuery,
        max_attempts: u32,
        poll_interval: Duration,
    ) -> ProbeResult<bool> {
        let outcome = self
            .verify_with(session, query, PollPolicy::attempts(max_attempts, poll_interval))
            .await?;
        Ok(outcome.is_match())
    }

    /// Verify under an arbitrary poll policy
    pub async fn verify_with(
        &self,
        session: &mut Session,
        query: &VerificationQuery,
        policy: PollPolicy,
    ) -> ProbeResult<Verification> {
        if query.is_vacuous() {
            tracing::warn!("vacuous verification query, nothing can identify the entity");
            return Ok(Verification::Exhausted {
                attempts: 0,
                last_row_count: 0,
            });
        }
        for locator in &self.view.open {
            session.click(locator).await?;
        }
        let element_timeout = session.timeouts().element;
        session
            .wait_until(&self.view.ready, WaitCondition::Visible, element_timeout)
            .await?;

        let clock = Arc::clone(&session.clock);
        let mut poller = policy.start(clock.as_ref());
        let mut last_row_count = 0;
        let mut outcome = None;

        while poller.next_attempt().await {
            let rows = session.read_rows(&self.view.rows).await?;
            last_row_count = rows.len();
            if let Some(row) = rows.find(query) {
                outcome = Some(Verification::Matched {
                    row: row.to_string(),
                    attempts: poller.attempts(),
                });
                break;
            }
            tracing::debug!(%query, attempt = poller.attempts(), rows = last_row_count, "no matching row yet");
        }

        let outcome = outcome.unwrap_or(Verification::Exhausted {
            attempts: poller.attempts(),
            last_row_count,
        });
        match &outcome {
            Verification::Matched { row, attempts } => {
                tracing::info!(%query, row = %row, attempts, "cross-view match");
            }
            Verification::Exhausted { attempts, last_row_count } => {
                tracing::warn!(%query, attempts, rows = last_row_count, "cross-view verification exhausted");
            }
            Verification::Stale { .. } => {}
        }

        if let Some(exit) = &self.view.exit {
            session.click(exit).await?;
        }
        Ok(outcome)
    }
}
