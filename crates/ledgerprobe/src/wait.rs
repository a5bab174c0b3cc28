//! Synchronization primitive.
//!
//! [`Session::wait_until`] blocks the workflow until a locator satisfies a
//! [`WaitCondition`] or the timeout elapses.
//!
//! The remote UI cannot tell "not rendered yet" apart from "will never
//! render": both surface as [`ProbeError::ElementNotReady`]. Callers that
//! treat absence as meaningful use [`Session::probe`], which turns that
//! error into `None`.

use crate::driver::ElementHandle;
use crate::locator::Locator;
use crate::poll::PollPolicy;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Predicate over one located element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaitCondition {
    /// Attached to the document
    Present,
    /// Attached and displayed
    Visible,
    /// Displayed and enabled
    Clickable,
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
        };
        f.write_str(name)
    }
}

impl Session {
    /// Poll until an element matching `locator` satisfies `condition`.
    ///
    /// Read-only. Driver errors during a poll count as "not ready yet",
    /// except an open dialog, which aborts immediately.
    ///
    /// # Errors
    ///
    /// [`ProbeError::ElementNotReady`] on timeout,
    /// [`ProbeError::UnresolvedDialog`] if a dialog blocks the page.
    pub async fn wait_until(
        &mut self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> ProbeResult<ElementHandle> {
        let clock = Arc::clone(&self.clock);
        let mut poller =
            PollPolicy::timeout(timeout, self.timeouts.poll_interval).start(clock.as_ref());

        while poller.next_attempt().await {
            self.ensure_no_dialog().await?;
            match self.check(locator, condition).await {
                Ok(Some(element)) => {
                    tracing::debug!(
                        %locator,
                        %condition,
                        polls = poller.attempts(),
                        elapsed_ms = poller.elapsed().as_millis() as u64,
                        "element ready"
                    );
                    return Ok(element);
                }
                Ok(None) => {}
                Err(e) if e.is_dialog_block() => return Err(e),
                Err(e) => tracing::debug!(%locator, error = %e, "transient driver error while waiting"),
            }
        }

        tracing::debug!(
            %locator,
            %condition,
            polls = poller.attempts(),
            timeout_ms = timeout.as_millis() as u64,
            "element not ready"
        );
        Err(ProbeError::ElementNotReady {
            locator: locator.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    /// Like [`Session::wait_until`], but a timeout yields `Ok(None)`
    pub async fn probe(
        &mut self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> ProbeResult<Option<ElementHandle>> {
        match self.wait_until(locator, condition, timeout).await {
            Ok(element) => Ok(Some(element)),
            Err(ProbeError::ElementNotReady { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn check(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> ProbeResult<Option<ElementHandle>> {
        for element in self.driver.find_elements(locator).await? {
            let ok = match condition {
                WaitCondition::Present => true,
                WaitCondition::Visible => self.driver.is_displayed(&element).await?,
                WaitCondition::Clickable => {
                    self.driver.is_displayed(&element).await?
                        && self.driver.is_enabled(&element).await?
                }
            };
            if ok {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}
