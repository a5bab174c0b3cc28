//! Verdicts and evidence returned to callers.
//!
//! A workflow never reports an expected rejection as an error. It returns a
//! [`WorkflowOutcome`] whose [`Verdict`] is reconciled from what the caller
//! expected and what the UI actually showed.

use crate::evidence::SnapshotRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller expects the application to do with the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// The mutation should be applied
    Accept,
    /// The mutation should be refused
    Reject,
}

/// How a rejection was signalled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionSignal {
    /// A dialog whose text did not classify as success
    Dialog,
    /// Inline validation markup or message
    InlineIndicator,
    /// No signal and nothing visible in the read view
    Silent,
}

/// What the UI showed, independent of expectation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observation {
    /// Mutation visible in the independent read view
    Accepted {
        /// Row that proved it
        matched_row: String,
    },
    /// Mutation refused
    Rejected {
        /// Channel of the refusal
        signal: RejectionSignal,
    },
    /// Success announced but not found in the read view
    ClaimedButUnobserved,
}

/// Tri-state workflow verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Applied as expected and independently confirmed
    Succeeded,
    /// Refused as expected
    ExpectedRejection,
    /// The application did something it should not have
    Defect,
}

impl Verdict {
    /// Reconcile expectation with observation
    #[must_use]
    pub const fn reconcile(expectation: Expectation, observation: &Observation) -> Self {
        match (expectation, observation) {
            (Expectation::Accept, Observation::Accepted { .. }) => Self::Succeeded,
            (Expectation::Reject, Observation::Rejected { .. }) => Self::ExpectedRejection,
            _ => Self::Defect,
        }
    }

    /// Whether the calling test should pass
    #[must_use]
    pub const fn passed(self) -> bool {
        !matches!(self, Self::Defect)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::ExpectedRejection => write!(f, "expected rejection"),
            Self::Defect => write!(f, "defect"),
        }
    }
}

/// Diagnostic material attached to every outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Dialog text, if a dialog appeared
    pub dialog_text: Option<String>,
    /// Inline message or indicator text
    pub inline_text: Option<String>,
    /// Row matched in the read view
    pub matched_row: Option<String>,
    /// Identifier parsed from the signal (e.g. account number)
    pub identifier: Option<String>,
    /// Account balance read before the mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_before: Option<u64>,
    /// Account balance read after verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<u64>,
    /// Snapshots captured along the way
    pub snapshots: Vec<SnapshotRef>,
    /// Free-form notes
    pub notes: Vec<String>,
}

impl Evidence {
    /// Append a note
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

/// Result of one workflow invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    /// Workflow name
    pub workflow: String,
    /// What the caller expected
    pub expectation: Expectation,
    /// What the UI showed
    pub observation: Observation,
    /// Reconciled verdict
    pub verdict: Verdict,
    /// Diagnostics
    pub evidence: Evidence,
}

impl WorkflowOutcome {
    /// Build an outcome, reconciling the verdict
    #[must_use]
    pub fn new(
        workflow: impl Into<String>,
        expectation: Expectation,
        observation: Observation,
        evidence: Evidence,
    ) -> Self {
        let verdict = Verdict::reconcile(expectation, &observation);
        Self {
            workflow: workflow.into(),
            expectation,
            observation,
            verdict,
            evidence,
        }
    }
}

// =============================================================================
// SECURITY AND FILTER OUTCOMES
// =============================================================================

/// Session-termination verdict.
///
/// Kept apart from [`Verdict`]: here finding the protected marker is the
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityVerdict {
    /// Protected UI unreachable after logout + back
    Secure,
    /// Protected UI still reachable
    Defect,
}

impl SecurityVerdict {
    /// Derive from whether the marker was found after back-navigation
    #[must_use]
    pub const fn from_marker_after_back(marker_found: bool) -> Self {
        if marker_found {
            Self::Defect
        } else {
            Self::Secure
        }
    }
}

/// Result of the session security probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityOutcome {
    /// Security verdict
    pub verdict: SecurityVerdict,
    /// Marker captured right after login
    pub marker: String,
    /// Marker text read after logout + back, if reachable
    pub marker_after_back: Option<String>,
    /// Diagnostics
    pub evidence: Evidence,
}

/// Filter reset verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterVerdict {
    /// Both filters read back empty
    Cleared,
    /// At least one filter kept its value
    Defect,
}

/// Result of the filter reset check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResetOutcome {
    /// Verdict
    pub verdict: FilterVerdict,
    /// Start filter value after reset
    pub start_value: String,
    /// End filter value after reset
    pub end_value: String,
    /// Diagnostics
    pub evidence: Evidence,
}
