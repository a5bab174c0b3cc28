//! Deposits, withdrawals and the transactions filter.

use super::{InlineMode, InlineSignal, Portal, Submission, VerifySettings, Workflow};
use crate::app::AppProfile;
use crate::locator::Locator;
use crate::outcome::{Evidence, Expectation, FilterResetOutcome, FilterVerdict};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::verify::{CrossViewVerifier, ListView, Verification, VerificationQuery};
use crate::wait::WaitCondition;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money in
    Deposit,
    /// Money out
    Withdrawal,
}

impl TransactionKind {
    /// Label the transactions list shows for this kind
    #[must_use]
    pub const fn ledger_label(self) -> &'static str {
        match self {
            Self::Deposit => "Credit",
            Self::Withdrawal => "Debit",
        }
    }

    /// Balance after moving `amount` from `before`, `None` on overdraft
    #[must_use]
    pub const fn settle(self, before: u64, amount: u64) -> Option<u64> {
        match self {
            Self::Deposit => before.checked_add(amount),
            Self::Withdrawal => before.checked_sub(amount),
        }
    }

    /// Rows ending in exactly `amount` followed by this kind's label
    pub fn ledger_query(self, amount: u64) -> ProbeResult<VerificationQuery> {
        let label = self.ledger_label();
        let pattern = Regex::new(&format!(r"(?:^|\s){amount}\s+{}\s*$", regex::escape(label)))
            .map_err(|e| ProbeError::invalid_state(e.to_string()))?;
        Ok(VerificationQuery::contains_all([label]).with_pattern(pattern))
    }

    fn tab(self, app: &AppProfile) -> &Locator {
        match self {
            Self::Deposit => &app.customer.deposit_tab,
            Self::Withdrawal => &app.customer.withdrawal_tab,
        }
    }

    fn submit(self, app: &AppProfile) -> &Locator {
        match self {
            Self::Deposit => &app.customer.deposit_submit,
            Self::Withdrawal => &app.customer.withdraw_submit,
        }
    }
}

/// Deposit or withdrawal input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Customer to log in as
    pub customer_name: String,
    /// Whole-unit amount
    pub amount: u64,
    /// What the application should do
    pub expect: Expectation,
}

impl TransactionInput {
    /// Input expected to succeed
    #[must_use]
    pub fn new(customer_name: impl Into<String>, amount: u64) -> Self {
        Self {
            customer_name: customer_name.into(),
            amount,
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

/// A deposit or a withdrawal from the customer dashboard
#[derive(Debug, Clone)]
pub struct Transaction {
    kind: TransactionKind,
    portal: Portal,
    verify: VerifySettings,
}

impl Transaction {
    /// Deposit workflow
    #[must_use]
    pub fn deposit(app: AppProfile) -> Self {
        Self::new(TransactionKind::Deposit, app)
    }

    /// Withdrawal workflow
    #[must_use]
    pub fn withdrawal(app: AppProfile) -> Self {
        Self::new(TransactionKind::Withdrawal, app)
    }

    /// Workflow of `kind`
    #[must_use]
    pub fn new(kind: TransactionKind, app: AppProfile) -> Self {
        Self {
            kind,
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

    /// Kind of transaction
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        self.kind
    }

    async fn read_balance(&self, session: &mut Session, evidence: &mut Evidence, when: &str) -> Option<u64> {
        match self.portal.balance(session).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                evidence.note(format!("balance {when} unreadable: {e}"));
                None
            }
        }
    }

    /// A matched row only counts when the balance moved by the amount.
    /// Unreadable balances leave the row as the only evidence.
    fn reconcile(&self, verification: Verification, amount: u64, evidence: &mut Evidence) -> Verification {
        let (Some(before), Some(after)) = (evidence.balance_before, evidence.balance_after) else {
            return verification;
        };
        let expected = self.kind.settle(before, amount);
        if !verification.is_match() || expected == Some(after) {
            return verification;
        }
        tracing::warn!(
            kind = ?self.kind,
            amount,
            before,
            after,
            "ledger row matched but the balance did not move"
        );
        evidence.note(format!(
            "balance went {before} -> {after}, expected {}",
            expected.map_or_else(|| "an overdraft refusal".to_string(), |b| b.to_string())
        ));
        verification.into_stale()
    }
}

#[async_trait]
impl Workflow for Transaction {
    type Input = TransactionInput;

    fn name(&self) -> &'static str {
        match self.kind {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }

    fn expectation(&self, input: &TransactionInput) -> Expectation {
        input.expect
    }

    fn submission(&self, session: &Session) -> Submission {
        let app = self.portal.app();
        Submission {
            dialog_timeout: session.timeouts().dialog,
            classifier: app.signals.transaction.clone(),
            inline: Some(InlineSignal {
                locator: app.customer.message.clone(),
                mode: InlineMode::Classify(app.signals.transaction.clone()),
            }),
        }
    }

    async fn perform(
        &self,
        session: &mut Session,
        input: &TransactionInput,
        evidence: &mut Evidence,
    ) -> ProbeResult<()> {
        let app = self.portal.app();
        self.portal
            .ensure_customer(session, &input.customer_name)
            .await?;
        evidence.balance_before = self.read_balance(session, evidence, "before").await;
        session.click(self.kind.tab(app)).await?;
        session
            .fill(&app.customer.amount, &input.amount.to_string())
            .await?;
        session.click(self.kind.submit(app)).await
    }

    async fn verify(
        &self,
        session: &mut Session,
        input: &TransactionInput,
        evidence: &mut Evidence,
    ) -> ProbeResult<Verification> {
        let customer = &self.portal.app().customer;
        let view = ListView::new(
            vec![customer.transactions_tab.clone()],
            customer.transactions_table.clone(),
            customer.transaction_rows.clone(),
        )
        .with_exit(customer.back_button.clone());
        let query = self.kind.ledger_query(input.amount)?;
        let verification = CrossViewVerifier::new(view)
            .verify_with(session, &query, self.verify.policy())
            .await?;
        evidence.balance_after = self.read_balance(session, evidence, "after").await;
        Ok(self.reconcile(verification, input.amount, evidence))
    }
}

/// Transactions date filter reset check
#[derive(Debug, Clone)]
pub struct ResetFilters {
    portal: Portal,
}

impl ResetFilters {
    /// Check for `app`
    #[must_use]
    pub fn new(app: AppProfile) -> Self {
        Self {
            portal: Portal::new(app),
        }
    }

    /// Fill both date filters, press reset, read them back.
    ///
    /// Both read back empty ⇒ [`FilterVerdict::Cleared`].
    pub async fn run(
        &self,
        session: &mut Session,
        customer_name: &str,
        start: &str,
        end: &str,
    ) -> ProbeResult<FilterResetOutcome> {
        let customer = &self.portal.app().customer;
        let mut evidence = Evidence::default();
        self.portal.ensure_customer(session, customer_name).await?;
        session.click(&customer.transactions_tab).await?;
        let timeout = session.timeouts().element;
        session
            .wait_until(&customer.start_date, WaitCondition::Visible, timeout)
            .await?;

        session.fill(&customer.start_date, start).await?;
        session.fill(&customer.end_date, end).await?;
        evidence.snapshots.push(session.snapshot("filters-set").await);
        session.click(&customer.reset_button).await?;

        let start_value = session.read_value(&customer.start_date).await?;
        let end_value = session.read_value(&customer.end_date).await?;
        evidence.snapshots.push(session.snapshot("filters-reset").await);

        let verdict = if start_value.is_empty() && end_value.is_empty() {
            FilterVerdict::Cleared
        } else {
            FilterVerdict::Defect
        };
        if verdict == FilterVerdict::Defect {
            tracing::warn!(start = %start_value, end = %end_value, "filters kept their values after reset");
        } else {
            tracing::info!("filters cleared");
        }

        Ok(FilterResetOutcome {
            verdict,
            start_value,
            end_value,
            evidence,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_labels() {
        assert_eq!(TransactionKind::Deposit.ledger_label(), "Credit");
        assert_eq!(TransactionKind::Withdrawal.ledger_label(), "Debit");
    }

    #[test]
    fn test_ledger_query_matches_whole_amount() {
        let q = TransactionKind::Deposit.ledger_query(100).unwrap();
        assert!(q.matches("Oct 19, 2026 04:40:37 PM 100 Credit"));
        assert!(!q.matches("Oct 19, 2026 04:40:37 PM 1000 Credit"));
        assert!(!q.matches("Oct 19, 2026 04:40:37 PM 2100 Credit"));
        assert!(!q.matches("Oct 19, 2026 04:40:37 PM 100 Debit"));
        // amount digits inside the timestamp do not count
        assert!(!q.matches("Jan 01, 2100 10:00:00 AM 5 Credit"));

        let q = TransactionKind::Withdrawal.ledger_query(50).unwrap();
        assert!(q.matches("Oct 19, 2026 04:40:37 PM 50 Debit"));
        assert!(!q.matches("Oct 19, 2026 04:40:37 PM 50 Credit"));
    }

    #[test]
    fn test_settle() {
        assert_eq!(TransactionKind::Deposit.settle(1000, 100), Some(1100));
        assert_eq!(TransactionKind::Withdrawal.settle(200, 50), Some(150));
        assert_eq!(TransactionKind::Withdrawal.settle(20, 50), None);
    }

    #[test]
    fn test_reconcile_demotes_match_when_balance_is_flat() {
        let deposit = Transaction::deposit(AppProfile::default());
        let matched = Verification::Matched {
            row: "Oct 19, 2026 04:40:37 PM 100 Credit".into(),
            attempts: 1,
        };

        let mut flat = Evidence {
            balance_before: Some(100),
            balance_after: Some(100),
            ..Evidence::default()
        };
        let v = deposit.reconcile(matched.clone(), 100, &mut flat);
        assert!(matches!(v, Verification::Stale { attempts: 1, .. }));
        assert_eq!(flat.notes.len(), 1);

        let mut moved = Evidence {
            balance_before: Some(100),
            balance_after: Some(200),
            ..Evidence::default()
        };
        assert!(deposit.reconcile(matched.clone(), 100, &mut moved).is_match());

        let mut unknown = Evidence::default();
        assert!(deposit.reconcile(matched, 100, &mut unknown).is_match());
    }

    #[test]
    fn test_names() {
        let app = AppProfile::default();
        assert_eq!(Transaction::deposit(app.clone()).name(), "deposit");
        assert_eq!(Transaction::withdrawal(app).name(), "withdrawal");
    }

    #[test]
    fn test_withdrawal_uses_app_spelling() {
        let app = AppProfile::default();
        assert!(TransactionKind::Withdrawal
            .tab(&app)
            .to_string()
            .contains("Withdrawl"));
    }
}
