//! Customer creation and the customers list.

use super::{InlineMode, InlineSignal, Portal, Submission, VerifySettings, Workflow};
use crate::app::AppProfile;
use crate::outcome::{Evidence, Expectation};
use crate::result::ProbeResult;
use crate::session::Session;
use crate::verify::{CrossViewVerifier, ListView, RowSet, Verification, VerificationQuery};
use crate::wait::WaitCondition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Add-customer form input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInput {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Post code
    pub post_code: String,
    /// Explicit expectation; derived from the field rules when absent
    #[serde(default)]
    pub expect: Option<Expectation>,
}

impl CustomerInput {
    /// Form input with a derived expectation
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        post_code: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            post_code: post_code.into(),
            expect: None,
        }
    }

    /// Override the expectation
    #[must_use]
    pub const fn expecting(mut self, expect: Expectation) -> Self {
        self.expect = Some(expect);
        self
    }

    /// Names alphabetic and non-empty, post code non-empty digits
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let alphabetic = |s: &str| !s.is_empty() && s.chars().all(char::is_alphabetic);
        alphabetic(&self.first_name)
            && alphabetic(&self.last_name)
            && !self.post_code.is_empty()
            && self.post_code.chars().all(|c| c.is_ascii_digit())
    }

    /// Expectation to reconcile against
    #[must_use]
    pub fn expectation(&self) -> Expectation {
        self.expect.unwrap_or(if self.is_well_formed() {
            Expectation::Accept
        } else {
            Expectation::Reject
        })
    }

    fn query(&self) -> VerificationQuery {
        VerificationQuery::contains_all([self.first_name.clone(), self.last_name.clone()])
    }
}

fn customers_view(app: &AppProfile) -> ListView {
    ListView::new(
        vec![app.manager.customers_tab.clone()],
        app.manager.customers_table.clone(),
        app.manager.customer_rows.clone(),
    )
}

/// Create a customer through the manager form
#[derive(Debug, Clone)]
pub struct CreateCustomer {
    portal: Portal,
    verify: VerifySettings,
}

impl CreateCustomer {
    /// Workflow for `app`
    #[must_use]
    pub fn new(app: AppProfile) -> Self {
        Self {
            portal: Portal::new(app),
            verify: VerifySettings::default(),
        }
    }

    /// Override verification attempts and spacing
    #[must_use]
    pub const fn with_verification(mut self, verify: VerifySettings) -> Self {
        self.verify = verify;
        self
    }
}

#[async_trait]
impl Workflow for CreateCustomer {
    type Input = CustomerInput;

    fn name(&self) -> &'static str {
        "create-customer"
    }

    fn expectation(&self, input: &CustomerInput) -> Expectation {
        input.expectation()
    }

    fn submission(&self, session: &Session) -> Submission {
        let app = self.portal.app();
        Submission {
            dialog_timeout: session.timeouts().dialog,
            classifier: app.signals.customer_created.clone(),
            inline: Some(InlineSignal {
                locator: app.manager.validation_indicator.clone(),
                mode: InlineMode::RejectOnPresence,
            }),
        }
    }

    async fn perform(
        &self,
        session: &mut Session,
        input: &CustomerInput,
        _evidence: &mut Evidence,
    ) -> ProbeResult<()> {
        let manager = &self.portal.app().manager;
        self.portal.ensure_manager(session).await?;
        session.click(&manager.add_customer_tab).await?;
        session.fill(&manager.first_name, &input.first_name).await?;
        session.fill(&manager.last_name, &input.last_name).await?;
        session.fill(&manager.post_code, &input.post_code).await?;
        session.click(&manager.add_customer_submit).await
    }

    async fn verify(
        &self,
        session: &mut Session,
        input: &CustomerInput,
        _evidence: &mut Evidence,
    ) -> ProbeResult<Verification> {
        CrossViewVerifier::new(customers_view(self.portal.app()))
            .verify_with(session, &input.query(), self.verify.policy())
            .await
    }
}

/// Read-only helpers over the customers list
#[derive(Debug, Clone)]
pub struct CustomerDirectory {
    portal: Portal,
}

impl CustomerDirectory {
    /// Directory for `app`
    #[must_use]
    pub fn new(app: AppProfile) -> Self {
        Self {
            portal: Portal::new(app),
        }
    }

    async fn open(&self, session: &mut Session) -> ProbeResult<()> {
        let view = customers_view(self.portal.app());
        self.portal.ensure_manager(session).await?;
        for locator in &view.open {
            session.click(locator).await?;
        }
        let timeout = session.timeouts().element;
        session
            .wait_until(&view.ready, WaitCondition::Visible, timeout)
            .await?;
        Ok(())
    }

    /// Every customer row
    pub async fn rows(&self, session: &mut Session) -> ProbeResult<RowSet> {
        self.open(session).await?;
        session.read_rows(&self.portal.app().manager.customer_rows).await
    }

    /// Number of customer rows
    pub async fn count(&self, session: &mut Session) -> ProbeResult<usize> {
        Ok(self.rows(session).await?.len())
    }

    /// Rows left after typing `term` into the search box
    pub async fn search(&self, session: &mut Session, term: &str) -> ProbeResult<RowSet> {
        let manager = &self.portal.app().manager;
        self.open(session).await?;
        session.fill(&manager.search, term).await?;
        let rows = session.read_rows(&manager.customer_rows).await?;
        tracing::info!(term, rows = rows.len(), "customer search");
        Ok(rows)
    }

    /// Whether a row carries both names
    pub async fn contains(
        &self,
        session: &mut Session,
        first_name: &str,
        last_name: &str,
    ) -> ProbeResult<bool> {
        let query = VerificationQuery::contains_all([first_name, last_name]);
        Ok(!query.is_vacuous() && self.rows(session).await?.find(&query).is_some())
    }

    /// Whether the add-customer form renders
    pub async fn form_displayed(&self, session: &mut Session) -> ProbeResult<bool> {
        let manager = &self.portal.app().manager;
        self.portal.ensure_manager(session).await?;
        session.click(&manager.add_customer_tab).await?;
        let timeout = session.timeouts().element;
        Ok(session
            .probe(&manager.first_name, WaitCondition::Visible, timeout)
            .await?
            .is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_expectation_rules() {
        assert_eq!(CustomerInput::new("Emmanuel", "Arhu", "12345").expectation(), Expectation::Accept);
        assert_eq!(CustomerInput::new("John123", "Smith", "12345").expectation(), Expectation::Reject);
        assert_eq!(CustomerInput::new("John@#$", "Smith!", "12345").expectation(), Expectation::Reject);
        assert_eq!(CustomerInput::new("John", "Smith", "ABCDE").expectation(), Expectation::Reject);
        assert_eq!(CustomerInput::new("", "", "").expectation(), Expectation::Reject);
    }

    #[test]
    fn test_explicit_expectation_wins() {
        let input = CustomerInput::new("John123", "Smith", "12345").expecting(Expectation::Accept);
        assert_eq!(input.expectation(), Expectation::Accept);
    }

    #[test]
    fn test_query_uses_both_names() {
        let q = CustomerInput::new("Emmanuel", "Arhu", "12345").query();
        assert_eq!(q.required(), ["Emmanuel".to_string(), "Arhu".to_string()]);
    }

    #[test]
    fn test_unicode_letters_are_alphabetic() {
        assert!(CustomerInput::new("Zoë", "Ørsted", "0042").is_well_formed());
    }
}
