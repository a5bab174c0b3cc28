//! Ledgerprobe: workflow verification for the XYZ Bank demo
//!
//! Drives the bank's UI through a [`UiDriver`], resolves native dialogs
//! explicitly, and confirms every claimed success by reading it back from
//! a second view. Each workflow ends in a [`Verdict`] reconciling what the
//! test expected with what the application actually did.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────────┐
//! │  Workflow   │──►│   Session    │──►│ UiDriver          │
//! │ (perform +  │   │ waits, dialog│   │ (chromium / mock) │
//! │  verify)    │   │ gate, evidence│  └───────────────────┘
//! └─────┬───────┘   └──────┬───────┘
//!       │                  │
//!       ▼                  ▼
//! ┌─────────────┐   ┌──────────────┐
//! │ Observation │──►│   Verdict    │
//! └─────────────┘   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ledgerprobe::mock::{BankBehavior, FakeBank};
//! use ledgerprobe::workflow::{CreateCustomer, CustomerInput, Workflow};
//! use ledgerprobe::{AppProfile, Session};
//!
//! # async fn demo() -> ledgerprobe::ProbeResult<()> {
//! let bank = FakeBank::new(BankBehavior::as_deployed());
//! let mut session = Session::new(Box::new(bank.driver()));
//! let outcome = CreateCustomer::new(AppProfile::default())
//!     .run(&mut session, &CustomerInput::new("John123", "Smith", "12345"))
//!     .await?;
//! println!("{}", outcome.verdict);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod app;
mod browser;
mod clock;
mod config;
mod dialog;
mod driver;
mod evidence;
mod locator;
mod outcome;
mod poll;
mod result;
mod session;
mod verify;
mod wait;

/// Scripted in-memory driver and the simulated bank
pub mod mock;

/// Business workflows over the bank's UI
pub mod workflow;

pub use app::{AppProfile, CustomerLocators, HomeLocators, ManagerLocators, Signals};
pub use browser::{launch, BrowserConfig};
#[cfg(feature = "browser")]
pub use browser::CdpDriver;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ProbeConfig, HEADLESS_ENV};
pub use dialog::{
    DialogAction, DialogEvent, DialogRecord, DialogState, KeywordMatch, OutcomeClassifier,
    SignalClass,
};
pub use driver::{ElementHandle, UiDriver};
pub use evidence::{EvidenceStore, SnapshotRef};
pub use locator::{Locator, Selector};
pub use outcome::{
    Evidence, Expectation, FilterResetOutcome, FilterVerdict, Observation, RejectionSignal,
    SecurityOutcome, SecurityVerdict, Verdict, WorkflowOutcome,
};
pub use poll::{PollPolicy, Poller, MIN_TIMED_INTERVAL};
pub use result::{ProbeError, ProbeResult};
pub use session::{Session, Timeouts};
pub use verify::{CrossViewVerifier, ListView, RowSet, Verification, VerificationQuery};
pub use wait::WaitCondition;
