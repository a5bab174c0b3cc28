//! Session security probe.
//!
//! Login, capture the dashboard marker, logout, then history-back. Finding
//! the marker again is the failure, so the result is a
//! [`SecurityVerdict`] rather than a workflow [`Verdict`](crate::Verdict).

use super::Portal;
use crate::app::AppProfile;
use crate::outcome::{Evidence, SecurityOutcome, SecurityVerdict};
use crate::result::ProbeResult;
use crate::session::Session;

/// Probe whether logout really ends the session
#[derive(Debug, Clone)]
pub struct SessionSecurityProbe {
    portal: Portal,
}

impl SessionSecurityProbe {
    /// Probe for `app`
    #[must_use]
    pub fn new(app: AppProfile) -> Self {
        Self {
            portal: Portal::new(app),
        }
    }

    /// Run the probe as `customer_name`.
    ///
    /// Login failures propagate: without a marker there is nothing to test.
    pub async fn run(&self, session: &mut Session, customer_name: &str) -> ProbeResult<SecurityOutcome> {
        let mut evidence = Evidence::default();

        let marker = self.portal.login_customer(session, customer_name).await?;
        evidence.snapshots.push(session.snapshot("logged-in").await);

        self.portal.logout(session).await?;
        session.back().await?;
        evidence.note(format!("url after back: {}", session.current_url().await.unwrap_or_default()));

        let timeout = session.timeouts().absence_probe;
        let marker_after_back = self.portal.dashboard_marker(session, timeout).await?;
        evidence.snapshots.push(session.snapshot("after-back").await);

        let verdict = SecurityVerdict::from_marker_after_back(marker_after_back.is_some());
        match verdict {
            SecurityVerdict::Secure => {
                tracing::info!(customer = customer_name, "protected view unreachable after logout");
            }
            SecurityVerdict::Defect => tracing::warn!(
                customer = customer_name,
                marker = ?marker_after_back,
                "protected view reachable after logout + back"
            ),
        }

        Ok(SecurityOutcome {
            verdict,
            marker,
            marker_after_back,
            evidence,
        })
    }
}
