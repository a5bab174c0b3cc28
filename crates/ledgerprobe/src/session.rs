//! Session handle: one driver, one clock, one dialog state machine.
//!
//! A [`Session`] is owned by exactly one workflow invocation at a time and
//! passed explicitly as `&mut Session`. Parallel runs provision one session
//! each; nothing is shared between them.

use crate::clock::{Clock, SystemClock};
use crate::dialog::{DialogRecord, DialogState};
use crate::driver::{ElementHandle, UiDriver};
use crate::evidence::{EvidenceStore, SnapshotRef};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::verify::RowSet;
use crate::wait::WaitCondition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Per-session timing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Element readiness wait
    pub element: Duration,
    /// Dialog probe after a submit
    pub dialog: Duration,
    /// Settle time before reading inline validation state
    pub inline_settle: Duration,
    /// Wait used when absence of an element is the interesting answer
    pub absence_probe: Duration,
    /// Interval of time-bounded polls
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element: Duration::from_secs(10),
            dialog: Duration::from_secs(5),
            inline_settle: Duration::from_secs(1),
            absence_probe: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Exclusive handle on one browser session
pub struct Session {
    id: String,
    pub(crate) driver: Box<dyn UiDriver>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) timeouts: Timeouts,
    pub(crate) dialog: DialogState,
    pub(crate) dialog_log: Vec<DialogRecord>,
    evidence: EvidenceStore,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("driver", &self.driver.name())
            .field("timeouts", &self.timeouts)
            .field("dialog", &self.dialog)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session on the wall clock with default timeouts
    #[must_use]
    pub fn new(driver: Box<dyn UiDriver>) -> Self {
        Self::with_clock(driver, Arc::new(SystemClock::new()))
    }

    /// Create a session on a specific clock
    #[must_use]
    pub fn with_clock(driver: Box<dyn UiDriver>, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            driver,
            clock,
            timeouts: Timeouts::default(),
            dialog: DialogState::NoDialog,
            dialog_log: Vec::new(),
            evidence: EvidenceStore::in_memory(),
        }
    }

    /// Replace the timeouts
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Write snapshots under `root/<session id>/`
    #[must_use]
    pub fn with_artifacts(mut self, root: &std::path::Path) -> Self {
        self.evidence = EvidenceStore::under(root, &self.id);
        self
    }

    /// Unique session id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Active timeouts
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Session clock
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Fail fast if a native dialog is blocking the page.
    ///
    /// Checks the local state machine first, then asks the driver, so a
    /// dialog nobody polled for is still caught before the next command.
    pub async fn ensure_no_dialog(&mut self) -> ProbeResult<()> {
        if let DialogState::DialogPresent(event) = &self.dialog {
            return Err(ProbeError::UnresolvedDialog {
                text: event.text.clone(),
            });
        }
        if let Some(text) = self.driver.dialog_text().await? {
            tracing::warn!(session = %self.id, text = %text, "action attempted with dialog open");
            self.dialog = DialogState::present(text.clone(), self.clock.elapsed());
            return Err(ProbeError::UnresolvedDialog { text });
        }
        Ok(())
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Load a URL
    pub async fn goto(&mut self, url: &str) -> ProbeResult<()> {
        self.ensure_no_dialog().await?;
        tracing::debug!(session = %self.id, url, "navigate");
        self.driver.navigate(url).await
    }

    /// History back
    pub async fn back(&mut self) -> ProbeResult<()> {
        self.ensure_no_dialog().await?;
        tracing::debug!(session = %self.id, "history back");
        self.driver.back().await
    }

    /// Current URL
    pub async fn current_url(&self) -> ProbeResult<String> {
        self.driver.current_url().await
    }

    /// Wait until clickable, then click
    pub async fn click(&mut self, locator: &Locator) -> ProbeResult<()> {
        let element = self.ready(locator, WaitCondition::Clickable).await?;
        tracing::debug!(session = %self.id, %locator, "click");
        self.driver.click(&element).await
    }

    /// Wait until visible, clear, then type
    pub async fn fill(&mut self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let element = self.ready(locator, WaitCondition::Visible).await?;
        tracing::debug!(session = %self.id, %locator, chars = text.chars().count(), "fill");
        self.driver.clear(&element).await?;
        if !text.is_empty() {
            self.driver.send_keys(&element, text).await?;
        }
        Ok(())
    }

    /// Choose an option by its visible text
    pub async fn select(&mut self, locator: &Locator, option: &str) -> ProbeResult<()> {
        let element = self.ready(locator, WaitCondition::Visible).await?;
        tracing::debug!(session = %self.id, %locator, option, "select");
        self.driver.select_by_text(&element, option).await
    }

    /// Rendered text of a visible element
    pub async fn read_text(&mut self, locator: &Locator) -> ProbeResult<String> {
        let element = self.ready(locator, WaitCondition::Visible).await?;
        self.driver.text(&element).await
    }

    /// Value of an input
    pub async fn read_value(&mut self, locator: &Locator) -> ProbeResult<String> {
        let element = self.ready(locator, WaitCondition::Present).await?;
        self.driver.value(&element).await
    }

    /// Visible texts of a select's options
    pub async fn options(&mut self, locator: &Locator) -> ProbeResult<Vec<String>> {
        let element = self.ready(locator, WaitCondition::Present).await?;
        self.driver.options(&element).await
    }

    /// Point-in-time snapshot of every row matching `locator`.
    ///
    /// Does not wait: zero rows is a valid answer.
    pub async fn read_rows(&mut self, locator: &Locator) -> ProbeResult<RowSet> {
        self.ensure_no_dialog().await?;
        let elements = self.driver.find_elements(locator).await?;
        let mut rows = Vec::with_capacity(elements.len());
        for element in &elements {
            rows.push(self.driver.text(element).await?);
        }
        tracing::debug!(session = %self.id, %locator, rows = rows.len(), "rows fetched");
        Ok(RowSet::new(rows))
    }

    /// Number of elements currently matching `locator`
    pub async fn count(&mut self, locator: &Locator) -> ProbeResult<usize> {
        self.ensure_no_dialog().await?;
        Ok(self.driver.find_elements(locator).await?.len())
    }

    /// Capture a screenshot as evidence; never fails
    pub async fn snapshot(&mut self, label: &str) -> SnapshotRef {
        let capture = if let DialogState::DialogPresent(event) = &self.dialog {
            Err(ProbeError::UnresolvedDialog {
                text: event.text.clone(),
            })
        } else {
            self.driver.screenshot().await
        };
        self.evidence.record(label, capture)
    }

    /// Release the browser
    pub async fn close(mut self) -> ProbeResult<()> {
        tracing::debug!(session = %self.id, "closing session");
        self.driver.close().await
    }

    async fn ready(
        &mut self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> ProbeResult<ElementHandle> {
        let timeout = self.timeouts.element;
        self.wait_until(locator, condition, timeout).await
    }
}
