//! End-to-end workflows against the simulated bank.
//!
//! Each scenario runs twice where it matters: once against a bank that
//! behaves, once against the demo as deployed with its known defects.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use ledgerprobe::mock::{BankBehavior, FakeBank};
use ledgerprobe::workflow::{
    AccountInput, CreateCustomer, CustomerDirectory, CustomerInput, OpenAccount, ResetFilters,
    SessionSecurityProbe, Transaction, TransactionInput, VerifySettings, Workflow,
};
use ledgerprobe::{
    AppProfile, Expectation, FakeClock, FilterVerdict, Observation, ProbeError, RejectionSignal,
    SecurityVerdict, Session, Verdict,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn session_on(bank: &FakeBank) -> Session {
    Session::with_clock(Box::new(bank.driver()), Arc::new(FakeClock::new()))
}

fn faithful() -> (FakeBank, Session) {
    let bank = FakeBank::new(BankBehavior::faithful());
    let session = session_on(&bank);
    (bank, session)
}

fn deployed() -> (FakeBank, Session) {
    let bank = FakeBank::new(BankBehavior::as_deployed());
    let session = session_on(&bank);
    (bank, session)
}

fn app() -> AppProfile {
    AppProfile::default()
}

// ============================================================================
// Customer creation
// ============================================================================

mod customer_tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_customer_succeeds_and_is_listed() {
        let (bank, mut session) = faithful();
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("Emmanuel", "Arhu", "12345"))
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::Succeeded);
        assert!(outcome
            .evidence
            .dialog_text
            .as_deref()
            .unwrap()
            .contains("successfully"));
        assert!(outcome.evidence.matched_row.unwrap().contains("Emmanuel Arhu 12345"));
        assert!(bank.customer("Emmanuel", "Arhu").is_some());
    }

    #[tokio::test]
    async fn test_valid_customer_also_succeeds_as_deployed() {
        let (_, mut session) = deployed();
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("Emmanuel", "Arhu", "12345"))
            .await
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Succeeded);
    }

    #[tokio::test]
    async fn test_numeric_name_rejected_inline_when_validated() {
        let (bank, mut session) = faithful();
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("John123", "Smith", "12345"))
            .await
            .unwrap();

        assert_eq!(outcome.expectation, Expectation::Reject);
        assert_eq!(outcome.verdict, Verdict::ExpectedRejection);
        assert_eq!(
            outcome.observation,
            Observation::Rejected {
                signal: RejectionSignal::InlineIndicator
            }
        );
        assert!(outcome.evidence.inline_text.is_some());
        assert!(bank.customer("John123", "Smith").is_none());
    }

    #[tokio::test]
    async fn test_numeric_name_is_defect_as_deployed() {
        let (bank, mut session) = deployed();
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("John123", "Smith", "12345"))
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::Defect);
        assert!(matches!(outcome.observation, Observation::Accepted { .. }));
        assert!(bank.customer("John123", "Smith").is_some());
    }

    #[tokio::test]
    async fn test_special_characters_are_defect_as_deployed() {
        let (_, mut session) = deployed();
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("John@#$", "Smith!", "12345"))
            .await
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Defect);
    }

    #[tokio::test]
    async fn test_alphabetic_post_code() {
        let (_, mut session) = faithful();
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("John", "Smith", "ABCDE"))
            .await
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::ExpectedRejection);

        let (_, mut session) = deployed();
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("John", "Smith", "ABCDE"))
            .await
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Defect);
    }

    #[tokio::test]
    async fn test_empty_fields_are_silently_rejected() {
        for (bank, mut session) in [faithful(), deployed()] {
            let outcome = CreateCustomer::new(app())
                .run(&mut session, &CustomerInput::new("", "", ""))
                .await
                .unwrap();

            assert_eq!(outcome.verdict, Verdict::ExpectedRejection);
            assert_eq!(
                outcome.observation,
                Observation::Rejected {
                    signal: RejectionSignal::Silent
                }
            );
            assert!(outcome.evidence.dialog_text.is_none());
            assert_eq!(bank.customers().len(), 5);
        }
    }

    #[tokio::test]
    async fn test_duplicate_customer_rejected_by_dialog() {
        let (bank, mut session) = faithful();
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("Harry", "Potter", "E725JB").expecting(Expectation::Reject))
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::ExpectedRejection);
        assert_eq!(
            outcome.observation,
            Observation::Rejected {
                signal: RejectionSignal::Dialog
            }
        );
        assert!(outcome.evidence.dialog_text.unwrap().contains("duplicate"));
        assert_eq!(bank.customers().len(), 5);
    }

    #[tokio::test]
    async fn test_lagging_list_is_retried() {
        let bank = FakeBank::new(BankBehavior::faithful().with_list_lag(2));
        let mut session = session_on(&bank);
        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("Luna", "Lovegood", "40400"))
            .await
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Succeeded);
    }

    #[tokio::test]
    async fn test_claim_without_row_is_defect() {
        let bank = FakeBank::new(BankBehavior::faithful().with_list_lag(10));
        let mut session = session_on(&bank);
        let settings = VerifySettings {
            attempts: 2,
            interval: Duration::from_millis(100),
        };
        let outcome = CreateCustomer::new(app())
            .with_verification(settings)
            .run(&mut session, &CustomerInput::new("Luna", "Lovegood", "40400"))
            .await
            .unwrap();

        assert_eq!(outcome.observation, Observation::ClaimedButUnobserved);
        assert_eq!(outcome.verdict, Verdict::Defect);
    }
}

// ============================================================================
// Accounts
// ============================================================================

mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_open_account_extracts_and_verifies_number() {
        let (bank, mut session) = faithful();
        let outcome = OpenAccount::new(app())
            .run(&mut session, &AccountInput::new("Harry Potter", "Dollar"))
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::Succeeded);
        assert_eq!(outcome.evidence.identifier.as_deref(), Some("1016"));
        assert!(outcome.evidence.matched_row.unwrap().contains("1016"));
        let harry = bank.customer("Harry", "Potter").unwrap();
        assert_eq!(harry.accounts.last().unwrap().number, 1016);
    }

    #[tokio::test]
    async fn test_dropdowns_list_customers_and_currencies() {
        let (_, mut session) = faithful();
        let wf = OpenAccount::new(app());
        let customers = wf.available_customers(&mut session).await.unwrap();
        assert_eq!(customers.len(), 5);
        assert!(customers.contains(&"Hermoine Granger".to_string()));

        let currencies = wf.available_currencies(&mut session).await.unwrap();
        assert_eq!(currencies, ["Dollar", "Pound", "Rupee"]);
    }

    #[tokio::test]
    async fn test_new_customer_can_get_an_account() {
        let (_, mut session) = faithful();
        CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("Luna", "Lovegood", "40400"))
            .await
            .unwrap();
        let outcome = OpenAccount::new(app())
            .run(&mut session, &AccountInput::new("Luna Lovegood", "Pound"))
            .await
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Succeeded);
    }
}

// ============================================================================
// Transactions
// ============================================================================

mod transaction_tests {
    use super::*;

    #[tokio::test]
    async fn test_deposit_is_credited() {
        let (bank, mut session) = faithful();
        let outcome = Transaction::deposit(app())
            .run(&mut session, &TransactionInput::new("Harry Potter", 100))
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::Succeeded);
        assert_eq!(outcome.evidence.inline_text.as_deref(), Some("Deposit Successful"));
        assert!(outcome.evidence.matched_row.unwrap().ends_with("100 Credit"));
        assert_eq!(outcome.evidence.balance_before, Some(0));
        assert_eq!(outcome.evidence.balance_after, Some(100));
        assert_eq!(bank.customer("Harry", "Potter").unwrap().accounts[0].balance, 100);
    }

    #[tokio::test]
    async fn test_withdrawal_after_deposit() {
        let (bank, mut session) = faithful();
        Transaction::deposit(app())
            .run(&mut session, &TransactionInput::new("Harry Potter", 200))
            .await
            .unwrap();
        let outcome = Transaction::withdrawal(app())
            .run(&mut session, &TransactionInput::new("Harry Potter", 50))
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::Succeeded);
        assert!(outcome.evidence.matched_row.unwrap().ends_with("50 Debit"));
        assert_eq!(bank.customer("Harry", "Potter").unwrap().accounts[0].balance, 150);
    }

    #[tokio::test]
    async fn test_overdraw_is_expected_rejection() {
        let (_, mut session) = faithful();
        let outcome = Transaction::withdrawal(app())
            .run(
                &mut session,
                &TransactionInput::new("Ron Weasly", 500).expecting(Expectation::Reject),
            )
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::ExpectedRejection);
        assert!(outcome
            .evidence
            .inline_text
            .unwrap()
            .contains("Transaction Failed"));
    }

    fn dropping_bank(booked: usize) -> (FakeBank, Session) {
        let bank = FakeBank::new(BankBehavior::faithful().dropping_transactions_after(booked));
        let session = session_on(&bank);
        (bank, session)
    }

    #[tokio::test]
    async fn test_claimed_deposit_without_row_is_defect() {
        let (bank, mut session) = dropping_bank(0);
        let outcome = Transaction::deposit(app())
            .run(&mut session, &TransactionInput::new("Harry Potter", 100))
            .await
            .unwrap();

        assert_eq!(outcome.evidence.inline_text.as_deref(), Some("Deposit Successful"));
        assert_eq!(outcome.observation, Observation::ClaimedButUnobserved);
        assert_eq!(outcome.verdict, Verdict::Defect);
        assert!(outcome.evidence.matched_row.is_none());
        assert_eq!(bank.customer("Harry", "Potter").unwrap().accounts[0].balance, 0);
    }

    #[tokio::test]
    async fn test_dropped_deposit_not_confirmed_by_larger_earlier_row() {
        let (_, mut session) = dropping_bank(1);
        let first = Transaction::deposit(app())
            .run(&mut session, &TransactionInput::new("Harry Potter", 1000))
            .await
            .unwrap();
        assert_eq!(first.verdict, Verdict::Succeeded);

        let outcome = Transaction::deposit(app())
            .run(&mut session, &TransactionInput::new("Harry Potter", 100))
            .await
            .unwrap();

        assert_eq!(outcome.observation, Observation::ClaimedButUnobserved);
        assert_eq!(outcome.verdict, Verdict::Defect);
        assert!(outcome.evidence.matched_row.is_none());
    }

    #[tokio::test]
    async fn test_dropped_repeat_deposit_not_confirmed_by_identical_row() {
        let (_, mut session) = dropping_bank(1);
        let deposit = Transaction::deposit(app());
        let input = TransactionInput::new("Harry Potter", 100);
        assert_eq!(deposit.run(&mut session, &input).await.unwrap().verdict, Verdict::Succeeded);

        let outcome = deposit.run(&mut session, &input).await.unwrap();

        assert_eq!(outcome.observation, Observation::ClaimedButUnobserved);
        assert_eq!(outcome.verdict, Verdict::Defect);
        assert_eq!(outcome.evidence.balance_before, Some(100));
        assert_eq!(outcome.evidence.balance_after, Some(100));
        assert!(outcome
            .evidence
            .notes
            .iter()
            .any(|n| n.contains("pre-existing row") && n.ends_with("100 Credit")));
    }

    #[tokio::test]
    async fn test_dropped_repeat_withdrawal_is_defect() {
        let (bank, mut session) = dropping_bank(2);
        Transaction::deposit(app())
            .run(&mut session, &TransactionInput::new("Harry Potter", 200))
            .await
            .unwrap();
        let withdrawal = Transaction::withdrawal(app());
        let input = TransactionInput::new("Harry Potter", 50);
        assert_eq!(withdrawal.run(&mut session, &input).await.unwrap().verdict, Verdict::Succeeded);

        let outcome = withdrawal.run(&mut session, &input).await.unwrap();

        assert_eq!(outcome.evidence.inline_text.as_deref(), Some("Transaction successful"));
        assert_eq!(outcome.verdict, Verdict::Defect);
        assert_eq!(bank.customer("Harry", "Potter").unwrap().accounts[0].balance, 150);
    }

    #[tokio::test]
    async fn test_filter_reset() {
        let (_, mut session) = faithful();
        let outcome = ResetFilters::new(app())
            .run(&mut session, "Hermoine Granger", "01/01/2015 12:00", "07/28/2015 12:00")
            .await
            .unwrap();
        assert_eq!(outcome.verdict, FilterVerdict::Cleared);

        let (_, mut session) = deployed();
        let outcome = ResetFilters::new(app())
            .run(&mut session, "Hermoine Granger", "01/01/2015 12:00", "07/28/2015 12:00")
            .await
            .unwrap();
        assert_eq!(outcome.verdict, FilterVerdict::Defect);
        assert_eq!(outcome.start_value, "01/01/2015 12:00");
        assert_eq!(outcome.end_value, "07/28/2015 12:00");
    }
}

// ============================================================================
// Session security
// ============================================================================

mod security_tests {
    use super::*;

    #[tokio::test]
    async fn test_logout_then_back_is_secure_when_session_ends() {
        let (_, mut session) = faithful();
        let outcome = SessionSecurityProbe::new(app())
            .run(&mut session, "Hermoine Granger")
            .await
            .unwrap();

        assert_eq!(outcome.marker, "Hermoine Granger");
        assert_eq!(outcome.verdict, SecurityVerdict::Secure);
        assert!(outcome.marker_after_back.is_none());
    }

    #[tokio::test]
    async fn test_logout_then_back_restores_dashboard_as_deployed() {
        let (_, mut session) = deployed();
        let outcome = SessionSecurityProbe::new(app())
            .run(&mut session, "Hermoine Granger")
            .await
            .unwrap();

        assert_eq!(outcome.verdict, SecurityVerdict::Defect);
        assert_eq!(outcome.marker_after_back.as_deref(), Some("Hermoine Granger"));
    }
}

// ============================================================================
// Directory and session plumbing
// ============================================================================

mod directory_tests {
    use super::*;

    #[tokio::test]
    async fn test_count_and_search() {
        let (_, mut session) = faithful();
        let directory = CustomerDirectory::new(app());
        assert_eq!(directory.count(&mut session).await.unwrap(), 5);

        let rows = directory.search(&mut session, "Harry").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows.rows()[0].contains("Potter"));

        assert!(directory.contains(&mut session, "Ron", "Weasly").await.unwrap());
        assert!(!directory.contains(&mut session, "", "").await.unwrap());
    }

    #[tokio::test]
    async fn test_form_displayed() {
        let (_, mut session) = faithful();
        assert!(CustomerDirectory::new(app())
            .form_displayed(&mut session)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_open_dialog_blocks_actions() {
        let (bank, mut session) = faithful();
        bank.driver().open_dialog("stray alert");

        let err = session.goto(&app().base_url).await.unwrap_err();
        assert!(err.is_dialog_block());
        assert!(matches!(err, ProbeError::UnresolvedDialog { .. }));
        assert!(!bank.driver().was_called("navigate:"));
    }

    #[tokio::test]
    async fn test_snapshots_written_under_artifacts() {
        let dir = TempDir::new().unwrap();
        let bank = FakeBank::new(BankBehavior::faithful());
        let mut session = session_on(&bank).with_artifacts(dir.path());

        let outcome = CreateCustomer::new(app())
            .run(&mut session, &CustomerInput::new("Emmanuel", "Arhu", "12345"))
            .await
            .unwrap();

        let snapshots = &outcome.evidence.snapshots;
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(|s| s.is_captured()));
        let first = snapshots[0].path.as_ref().unwrap();
        assert!(first.exists());
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("001_"));
    }
}
