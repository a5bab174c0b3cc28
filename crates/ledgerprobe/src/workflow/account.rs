//! Account opening.

use super::{Portal, Signal, Submission, VerifySettings, Workflow};
use crate::app::AppProfile;
use crate::dialog::SignalClass;
use crate::outcome::{Evidence, Expectation};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::verify::{CrossViewVerifier, ListView, Verification, VerificationQuery};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Numeric identifier following `delimiter` in `text`.
///
/// Empty when the delimiter is missing (or empty) or no digits follow it.
#[must_use]
pub fn extract_identifier(text: &str, delimiter: &str) -> String {
    if delimiter.is_empty() {
        return String::new();
    }
    text.split_once(delimiter)
        .map(|(_, rest)| {
            rest.trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect()
        })
        .unwrap_or_default()
}

/// Open-account form input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInput {
    /// Customer as listed in the dropdown ("First Last")
    pub customer_name: String,
    /// Currency as listed in the dropdown
    pub currency: String,
    /// What the application should do
    #[serde(default = "accept")]
    pub expect: Expectation,
}

const fn accept() -> Expectation {
    Expectation::Accept
}

impl AccountInput {
    /// Input expected to succeed
    #[must_use]
    pub fn new(customer_name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            currency: currency.into(),
            expect: Expectation::Accept,
        }
    }

    /// Override the expectation
    #[must_use]
    pub const fn expecting(mut self, expect: Expectation) -> Self {
        self.expect = expect;
        self
    }
}

/// Open an account for an existing customer
#[derive(Debug, Clone)]
pub struct OpenAccount {
    portal: Portal,
    verify: VerifySettings,
}

impl OpenAccount {
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

    /// Customers offered by the dropdown
    pub async fn available_customers(&self, session: &mut Session) -> ProbeResult<Vec<String>> {
        let select = self.portal.app().manager.customer_select.clone();
        self.listed_options(session, &select).await
    }

    /// Currencies offered by the dropdown
    pub async fn available_currencies(&self, session: &mut Session) -> ProbeResult<Vec<String>> {
        let select = self.portal.app().manager.currency_select.clone();
        self.listed_options(session, &select).await
    }

    async fn listed_options(
        &self,
        session: &mut Session,
        select: &crate::locator::Locator,
    ) -> ProbeResult<Vec<String>> {
        self.portal.ensure_manager(session).await?;
        session
            .click(&self.portal.app().manager.open_account_tab)
            .await?;
        Ok(session
            .options(select)
            .await?
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty() && !o.contains("---"))
            .collect())
    }

    fn query(input: &AccountInput, evidence: &Evidence) -> ProbeResult<VerificationQuery> {
        let mut required: Vec<String> = input
            .customer_name
            .split_whitespace()
            .map(str::to_string)
            .collect();
        match &evidence.identifier {
            Some(id) => {
                required.push(id.clone());
                Ok(VerificationQuery::contains_all(required))
            }
            None => {
                let any_number = Regex::new(r"\d{4}")
                    .map_err(|e| ProbeError::invalid_state(e.to_string()))?;
                Ok(VerificationQuery::contains_all(required).with_pattern(any_number))
            }
        }
    }
}

#[async_trait]
impl Workflow for OpenAccount {
    type Input = AccountInput;

    fn name(&self) -> &'static str {
        "open-account"
    }

    fn expectation(&self, input: &AccountInput) -> Expectation {
        input.expect
    }

    fn submission(&self, session: &Session) -> Submission {
        Submission {
            dialog_timeout: session.timeouts().dialog,
            classifier: self.portal.app().signals.account_opened.clone(),
            inline: None,
        }
    }

    async fn perform(
        &self,
        session: &mut Session,
        input: &AccountInput,
        _evidence: &mut Evidence,
    ) -> ProbeResult<()> {
        let manager = &self.portal.app().manager;
        self.portal.ensure_manager(session).await?;
        session.click(&manager.open_account_tab).await?;
        session
            .select(&manager.customer_select, &input.customer_name)
            .await?;
        session.select(&manager.currency_select, &input.currency).await?;
        session.click(&manager.process_submit).await
    }

    fn annotate(&self, signal: &Signal, evidence: &mut Evidence) {
        if let Signal::Dialog {
            text,
            class: SignalClass::Success,
        } = signal
        {
            let delimiter = &self.portal.app().signals.account_number_delimiter;
            let id = extract_identifier(text, delimiter);
            if id.is_empty() {
                evidence.note(format!("no account number after {delimiter:?}"));
            } else {
                tracing::info!(account = %id, "account number extracted");
                evidence.identifier = Some(id);
            }
        }
    }

    async fn verify(
        &self,
        session: &mut Session,
        input: &AccountInput,
        evidence: &mut Evidence,
    ) -> ProbeResult<Verification> {
        let app = self.portal.app();
        let view = ListView::new(
            vec![app.manager.customers_tab.clone()],
            app.manager.customers_table.clone(),
            app.manager.customer_rows.clone(),
        );
        let query = Self::query(input, evidence)?;
        CrossViewVerifier::new(view)
            .verify_with(session, &query, self.verify.policy())
            .await
    }
}
