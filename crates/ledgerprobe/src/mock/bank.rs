//! In-memory XYZ Bank.
//!
//! [`FakeBank`] renders the demo's screens onto a [`MockDriver`] using the
//! locators of an [`AppProfile`], and reacts to clicks the way the real
//! AngularJS app does: hash-route changes, native alerts for customer and
//! account creation, inline messages for transactions.
//!
//! [`BankBehavior`] switches between a bank that validates input and ends
//! sessions properly, and the deployed demo with its known defects.

use super::{MockDriver, MockElement, MockPage};
use crate::app::AppProfile;
use crate::locator::Locator;
use crate::workflow::TransactionKind;
use std::sync::{Arc, Mutex};

const CURRENCIES: [&str; 3] = ["Dollar", "Pound", "Rupee"];

/// Which defects the simulated bank has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankBehavior {
    /// Reject names with digits or symbols
    pub validates_names: bool,
    /// Reject non-numeric post codes
    pub validates_post_code: bool,
    /// Logout invalidates the dashboard route
    pub terminates_session_on_logout: bool,
    /// Reset empties the date filters
    pub reset_clears_filters: bool,
    /// Customers-list fetches that miss a freshly added customer
    pub customers_list_lag: u32,
    /// Transactions an account books before further ones are reported
    /// successful but never recorded
    pub drops_transactions_after: Option<usize>,
}

impl BankBehavior {
    /// A bank that behaves correctly
    #[must_use]
    pub const fn faithful() -> Self {
        Self {
            validates_names: true,
            validates_post_code: true,
            terminates_session_on_logout: true,
            reset_clears_filters: true,
            customers_list_lag: 0,
            drops_transactions_after: None,
        }
    }

    /// The demo as deployed: no input validation, history-back restores
    /// the dashboard, reset leaves the dates in place
    #[must_use]
    pub const fn as_deployed() -> Self {
        Self {
            validates_names: false,
            validates_post_code: false,
            terminates_session_on_logout: false,
            reset_clears_filters: false,
            customers_list_lag: 0,
            drops_transactions_after: None,
        }
    }

    /// Delay new customers in the list by `fetches`
    #[must_use]
    pub const fn with_list_lag(mut self, fetches: u32) -> Self {
        self.customers_list_lag = fetches;
        self
    }

    /// Book `booked` transactions per account, then claim success for
    /// the rest without recording them
    #[must_use]
    pub const fn dropping_transactions_after(mut self, booked: usize) -> Self {
        self.drops_transactions_after = Some(booked);
        self
    }
}

impl Default for BankBehavior {
    fn default() -> Self {
        Self::faithful()
    }
}

/// One account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankAccount {
    /// Account number
    pub number: u32,
    /// Currency
    pub currency: String,
    /// Balance
    pub balance: u64,
    /// (amount, kind) in booking order
    pub transactions: Vec<(u64, TransactionKind)>,
}

impl BankAccount {
    fn new(number: u32, currency: &str) -> Self {
        Self {
            number,
            currency: currency.to_string(),
            balance: 0,
            transactions: Vec::new(),
        }
    }
}

/// One customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankCustomer {
    /// Customer id
    pub id: u32,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Post code
    pub post_code: String,
    /// Accounts, first one is shown on the dashboard
    pub accounts: Vec<BankAccount>,
}

impl BankCustomer {
    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn row_text(&self) -> String {
        let mut row = format!("{} {} {}", self.first_name, self.last_name, self.post_code);
        for account in &self.accounts {
            row.push_str(&format!(" {}", account.number));
        }
        row.push_str(" Delete");
        row
    }
}

fn seed() -> Vec<BankCustomer> {
    let people = [
        ("Hermoine", "Granger", "E859AB"),
        ("Harry", "Potter", "E725JB"),
        ("Ron", "Weasly", "E55555"),
        ("Albus", "Dumbledore", "E55656"),
        ("Neville", "Longbottom", "E89898"),
    ];
    let mut number = 1001;
    people
        .iter()
        .zip(1..)
        .map(|(&(first, last, post), id)| {
            let accounts = CURRENCIES
                .iter()
                .map(|currency| {
                    let account = BankAccount::new(number, currency);
                    number += 1;
                    account
                })
                .collect();
            BankCustomer {
                id,
                first_name: first.to_string(),
                last_name: last.to_string(),
                post_code: post.to_string(),
                accounts,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerTab {
    None,
    AddCustomer,
    OpenAccount,
    Customers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DashboardTab {
    None,
    Deposit,
    Withdrawal,
    Transactions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Home,
    Manager(ManagerTab),
    CustomerLogin,
    Dashboard(DashboardTab),
}

impl Screen {
    const fn route(self) -> &'static str {
        match self {
            Self::Home => "#/login",
            Self::Manager(ManagerTab::None) => "#/manager",
            Self::Manager(ManagerTab::AddCustomer) => "#/manager/addCust",
            Self::Manager(ManagerTab::OpenAccount) => "#/manager/openAccount",
            Self::Manager(ManagerTab::Customers) => "#/manager/list",
            Self::CustomerLogin => "#/customer",
            Self::Dashboard(_) => "#/account",
        }
    }

    fn from_url(url: &str) -> Self {
        let route = url.find('#').map_or("", |i| &url[i..]);
        match route {
            "#/manager/addCust" => Self::Manager(ManagerTab::AddCustomer),
            "#/manager/openAccount" => Self::Manager(ManagerTab::OpenAccount),
            "#/manager/list" => Self::Manager(ManagerTab::Customers),
            r if r.starts_with("#/manager") => Self::Manager(ManagerTab::None),
            "#/customer" => Self::CustomerLogin,
            "#/account" => Self::Dashboard(DashboardTab::None),
            _ => Self::Home,
        }
    }
}

#[derive(Debug)]
struct BankState {
    app: AppProfile,
    behavior: BankBehavior,
    customers: Vec<BankCustomer>,
    next_customer_id: u32,
    next_account: u32,
    screen: Screen,
    session_user: Option<usize>,
    remembered_user: Option<usize>,
    form: [String; 3],
    validation: Option<String>,
    message: Option<String>,
    filters: (String, String),
    search: String,
    lag_pending: bool,
}

type Shared = Arc<Mutex<BankState>>;
type Action = fn(&mut BankState, &mut MockPage);

/// Run `action` and re-render on every click of `locator`
fn bind(driver: &MockDriver, state: &Shared, locator: &Locator, action: Action) {
    let state = Arc::clone(state);
    driver.on_click(locator, move |page| {
        if let Ok(mut bank) = state.lock() {
            action(&mut *bank, page);
            bank.render(page);
        }
    });
}

impl BankState {
    fn base(&self) -> &str {
        self.app
            .base_url
            .find('#')
            .map_or(self.app.base_url.as_str(), |i| &self.app.base_url[..i])
    }

    /// Switch screen through a hash-route change (pushes history)
    fn go(&mut self, page: &mut MockPage, screen: Screen) {
        self.screen = screen;
        self.message = None;
        let target = format!("{}{}", self.base(), screen.route());
        if page.url != target {
            let previous = std::mem::replace(&mut page.url, target);
            page.history.push(previous);
        }
    }

    /// Switch screen in place (redirect, no history entry)
    fn redirect(&mut self, page: &mut MockPage, screen: Screen) {
        self.screen = screen;
        page.url = format!("{}{}", self.base(), screen.route());
    }

    fn arrive(&mut self, page: &mut MockPage) {
        let screen = Screen::from_url(&page.url);
        if let Screen::Dashboard(_) = screen {
            if self.session_user.is_none() {
                if self.behavior.terminates_session_on_logout {
                    self.redirect(page, Screen::CustomerLogin);
                    return;
                }
                self.session_user = self.remembered_user;
            }
            if self.session_user.is_none() {
                self.redirect(page, Screen::CustomerLogin);
                return;
            }
        }
        self.screen = screen;
    }

    // -------------------------------------------------------------------------
    // Manager actions
    // -------------------------------------------------------------------------

    fn add_customer(&mut self, page: &mut MockPage) {
        let m = &self.app.manager;
        let form = [
            page.value_of(&m.first_name).unwrap_or_default(),
            page.value_of(&m.last_name).unwrap_or_default(),
            page.value_of(&m.post_code).unwrap_or_default(),
        ];
        let [first, last, post] = &form;
        // HTML5 `required` keeps empty forms from submitting at all.
        if form.iter().any(String::is_empty) {
            self.form = form;
            return;
        }

        let bad_name = |s: &str| !s.chars().all(char::is_alphabetic);
        if self.behavior.validates_names && (bad_name(first.as_str()) || bad_name(last.as_str())) {
            self.validation = Some("Names may contain letters only".to_string());
            self.form = form;
            return;
        }
        if self.behavior.validates_post_code && !post.chars().all(|c| c.is_ascii_digit()) {
            self.validation = Some("Post Code must be numeric".to_string());
            self.form = form;
            return;
        }
        self.validation = None;

        let duplicate = self
            .customers
            .iter()
            .any(|c| &c.first_name == first && &c.last_name == last && &c.post_code == post);
        if duplicate {
            page.raise_dialog("Please check the details. Customer may be duplicate.");
            self.form = form;
            return;
        }

        let id = self.next_customer_id;
        self.next_customer_id += 1;
        self.customers.push(BankCustomer {
            id,
            first_name: first.clone(),
            last_name: last.clone(),
            post_code: post.clone(),
            accounts: Vec::new(),
        });
        self.form = Default::default();
        self.lag_pending = self.behavior.customers_list_lag > 0;
        page.raise_dialog(format!("Customer added successfully with customer id :{id}"));
    }

    fn open_account(&mut self, page: &mut MockPage) {
        let m = &self.app.manager;
        let name = page.value_of(&m.customer_select).unwrap_or_default();
        let currency = page.value_of(&m.currency_select).unwrap_or_default();
        let Some(customer) = self.customers.iter_mut().find(|c| c.full_name() == name) else {
            return;
        };
        if !CURRENCIES.contains(&currency.as_str()) {
            return;
        }
        let number = self.next_account;
        self.next_account += 1;
        customer.accounts.push(BankAccount::new(number, &currency));
        page.raise_dialog(format!(
            "Account created successfully with account Number :{number}"
        ));
    }

    // -------------------------------------------------------------------------
    // Customer actions
    // -------------------------------------------------------------------------

    fn login(&mut self, page: &mut MockPage) {
        let name = page
            .value_of(&self.app.customer.user_select)
            .unwrap_or_default();
        if let Some(idx) = self.customers.iter().position(|c| c.full_name() == name) {
            self.session_user = Some(idx);
            self.remembered_user = Some(idx);
            self.go(page, Screen::Dashboard(DashboardTab::None));
        }
    }

    fn logout(&mut self, page: &mut MockPage) {
        self.session_user = None;
        if self.behavior.terminates_session_on_logout {
            self.remembered_user = None;
        }
        self.go(page, Screen::CustomerLogin);
    }

    fn account_mut(&mut self) -> Option<&mut BankAccount> {
        let idx = self.session_user?;
        self.customers.get_mut(idx)?.accounts.first_mut()
    }

    fn transact(&mut self, page: &mut MockPage, kind: TransactionKind) {
        let amount: u64 = page
            .value_of(&self.app.customer.amount)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        if amount == 0 {
            return;
        }
        let drop_after = self.behavior.drops_transactions_after;
        let Some(account) = self.account_mut() else {
            return;
        };
        let books = drop_after.map_or(true, |n| account.transactions.len() < n);
        let message = match kind {
            TransactionKind::Deposit => {
                if books {
                    account.balance += amount;
                    account.transactions.push((amount, kind));
                }
                "Deposit Successful"
            }
            TransactionKind::Withdrawal if amount <= account.balance => {
                if books {
                    account.balance -= amount;
                    account.transactions.push((amount, kind));
                }
                "Transaction successful"
            }
            TransactionKind::Withdrawal => {
                "Transaction Failed. You can not withdraw amount more than the balance."
            }
        };
        self.message = Some(message.to_string());
    }

    fn reset_filters(&mut self, page: &mut MockPage) {
        let c = &self.app.customer;
        self.filters = if self.behavior.reset_clears_filters {
            (String::new(), String::new())
        } else {
            (
                page.value_of(&c.start_date).unwrap_or_default(),
                page.value_of(&c.end_date).unwrap_or_default(),
            )
        };
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    fn render(&mut self, page: &mut MockPage) {
        let app = self.app.clone();
        page.clear_elements();
        page.insert(MockElement::new(&app.home.title).with_text("XYZ Bank"));
        page.insert(MockElement::new(&app.home.home_button).with_text("Home"));

        match self.screen {
            Screen::Home => {
                page.insert(MockElement::new(&app.home.customer_login).with_text("Customer Login"));
                page.insert(MockElement::new(&app.home.manager_login).with_text("Bank Manager Login"));
            }
            Screen::Manager(tab) => self.render_manager(page, tab),
            Screen::CustomerLogin => {
                page.insert(
                    MockElement::new(&app.customer.user_select).with_options(self.names("---Your Name---")),
                );
                page.insert(MockElement::new(&app.customer.login_button).with_text("Login"));
            }
            Screen::Dashboard(tab) => self.render_dashboard(page, tab),
        }
    }

    fn names(&self, placeholder: &str) -> Vec<String> {
        std::iter::once(placeholder.to_string())
            .chain(self.customers.iter().map(BankCustomer::full_name))
            .collect()
    }

    fn render_manager(&mut self, page: &mut MockPage, tab: ManagerTab) {
        let m = self.app.manager.clone();
        page.insert(MockElement::new(&m.add_customer_tab).with_text("Add Customer"));
        page.insert(MockElement::new(&m.open_account_tab).with_text("Open Account"));
        page.insert(MockElement::new(&m.customers_tab).with_text("Customers"));

        match tab {
            ManagerTab::None => {}
            ManagerTab::AddCustomer => {
                let [first, last, post] = &self.form;
                page.insert(MockElement::new(&m.first_name).with_value(first.as_str()));
                page.insert(MockElement::new(&m.last_name).with_value(last.as_str()));
                page.insert(MockElement::new(&m.post_code).with_value(post.as_str()));
                page.insert(MockElement::new(&m.add_customer_submit).with_text("Add Customer"));
                if let Some(text) = &self.validation {
                    page.insert(MockElement::new(&m.validation_indicator).with_text(text.as_str()));
                }
            }
            ManagerTab::OpenAccount => {
                page.insert(
                    MockElement::new(&m.customer_select).with_options(self.names("---Customer Name---")),
                );
                page.insert(MockElement::new(&m.currency_select).with_options(
                    std::iter::once("---Currency---").chain(CURRENCIES),
                ));
                page.insert(MockElement::new(&m.process_submit).with_text("Process"));
            }
            ManagerTab::Customers => {
                page.insert(MockElement::new(&m.search).with_value(self.search.as_str()));
                page.insert(MockElement::new(&m.customers_table));
                self.render_customer_rows(page);
            }
        }
    }

    fn render_customer_rows(&mut self, page: &mut MockPage) {
        let rows = self.app.manager.customer_rows.clone();
        page.remove(&rows);
        let seen = page.lookups.get(&rows.to_string()).copied().unwrap_or(0);
        let term = self.search.to_lowercase();
        let newest = self.customers.len().saturating_sub(1);
        for (idx, customer) in self.customers.iter().enumerate() {
            let matches = term.is_empty()
                || [&customer.first_name, &customer.last_name, &customer.post_code]
                    .iter()
                    .any(|f| f.to_lowercase().contains(&term));
            if !matches {
                continue;
            }
            let mut row = MockElement::new(&rows).with_text(customer.row_text());
            if self.lag_pending && idx == newest {
                row = row.appearing_after(seen + self.behavior.customers_list_lag);
            }
            page.insert(row);
        }
        self.lag_pending = false;
    }

    fn render_dashboard(&self, page: &mut MockPage, tab: DashboardTab) {
        let c = &self.app.customer;
        let Some(customer) = self.session_user.and_then(|i| self.customers.get(i)) else {
            return;
        };
        page.insert(MockElement::new(&c.welcome).with_text(customer.full_name()));
        page.insert(MockElement::new(&c.logout).with_text("Logout"));
        page.insert(MockElement::new(&c.transactions_tab).with_text("Transactions"));
        page.insert(MockElement::new(&c.deposit_tab).with_text("Deposit"));
        page.insert(MockElement::new(&c.withdrawal_tab).with_text("Withdrawl"));

        let account = customer.accounts.first();
        page.insert(MockElement::new(&c.balance_panel).with_text(account.map_or_else(
            || "Please open an account with us.".to_string(),
            |a| {
                format!(
                    "Account Number : {} , Balance : {} , Currency : {}",
                    a.number, a.balance, a.currency
                )
            },
        )));

        match tab {
            DashboardTab::None => {}
            DashboardTab::Deposit | DashboardTab::Withdrawal => {
                let submit = if tab == DashboardTab::Deposit {
                    (&c.deposit_submit, "Deposit")
                } else {
                    (&c.withdraw_submit, "Withdraw")
                };
                page.insert(MockElement::new(&c.amount));
                page.insert(MockElement::new(submit.0).with_text(submit.1));
                if let Some(message) = &self.message {
                    page.insert(MockElement::new(&c.message).with_text(message.as_str()));
                }
            }
            DashboardTab::Transactions => {
                page.insert(MockElement::new(&c.back_button).with_text("Back"));
                page.insert(MockElement::new(&c.start_date).with_value(self.filters.0.as_str()));
                page.insert(MockElement::new(&c.end_date).with_value(self.filters.1.as_str()));
                page.insert(MockElement::new(&c.reset_button).with_text("Reset"));
                page.insert(MockElement::new(&c.transactions_table));
                let booked = chrono::Utc::now().format("%b %d, %Y %r").to_string();
                for (amount, kind) in account.map(|a| a.transactions.as_slice()).unwrap_or_default() {
                    page.insert(
                        MockElement::new(&c.transaction_rows)
                            .with_text(format!("{booked} {amount} {}", kind.ledger_label())),
                    );
                }
            }
        }
    }
}

/// XYZ Bank simulated on a [`MockDriver`]
#[derive(Debug, Clone)]
pub struct FakeBank {
    driver: MockDriver,
    state: Shared,
}

impl FakeBank {
    /// Bank with the default profile
    #[must_use]
    pub fn new(behavior: BankBehavior) -> Self {
        Self::with_profile(AppProfile::default(), behavior)
    }

    /// Bank rendered with `app`'s locators
    #[must_use]
    pub fn with_profile(app: AppProfile, behavior: BankBehavior) -> Self {
        let driver = MockDriver::new();
        let state: Shared = Arc::new(Mutex::new(BankState {
            app: app.clone(),
            behavior,
            customers: seed(),
            next_customer_id: 6,
            next_account: 1016,
            screen: Screen::Home,
            session_user: None,
            remembered_user: None,
            form: Default::default(),
            validation: None,
            message: None,
            filters: (String::new(), String::new()),
            search: String::new(),
            lag_pending: false,
        }));

        let on = |locator: &Locator, action: Action| bind(&driver, &state, locator, action);

        on(&app.home.customer_login, |b, p| b.go(p, Screen::CustomerLogin));
        on(&app.home.manager_login, |b, p| b.go(p, Screen::Manager(ManagerTab::None)));
        on(&app.home.home_button, |b, p| b.go(p, Screen::Home));

        on(&app.manager.add_customer_tab, |b, p| {
            b.validation = None;
            b.go(p, Screen::Manager(ManagerTab::AddCustomer));
        });
        on(&app.manager.open_account_tab, |b, p| {
            b.go(p, Screen::Manager(ManagerTab::OpenAccount));
        });
        on(&app.manager.customers_tab, |b, p| {
            b.search.clear();
            b.go(p, Screen::Manager(ManagerTab::Customers));
        });
        on(&app.manager.add_customer_submit, BankState::add_customer);
        on(&app.manager.process_submit, BankState::open_account);

        on(&app.customer.login_button, BankState::login);
        on(&app.customer.logout, BankState::logout);
        on(&app.customer.deposit_tab, |b, p| b.go(p, Screen::Dashboard(DashboardTab::Deposit)));
        on(&app.customer.withdrawal_tab, |b, p| {
            b.go(p, Screen::Dashboard(DashboardTab::Withdrawal));
        });
        on(&app.customer.transactions_tab, |b, p| {
            b.go(p, Screen::Dashboard(DashboardTab::Transactions));
        });
        on(&app.customer.back_button, |b, p| b.go(p, Screen::Dashboard(DashboardTab::None)));
        on(&app.customer.deposit_submit, |b, p| b.transact(p, TransactionKind::Deposit));
        on(&app.customer.withdraw_submit, |b, p| b.transact(p, TransactionKind::Withdrawal));
        on(&app.customer.reset_button, BankState::reset_filters);

        let search_state = Arc::clone(&state);
        let search = app.manager.search.clone();
        driver.on_input(&app.manager.search, move |page| {
            if let Ok(mut bank) = search_state.lock() {
                bank.search = page.value_of(&search).unwrap_or_default();
                bank.render_customer_rows(page);
            }
        });

        let nav_state = Arc::clone(&state);
        driver.on_navigate(move |page, _url| {
            if let Ok(mut bank) = nav_state.lock() {
                bank.arrive(page);
                bank.render(page);
            }
        });
        let back_state = Arc::clone(&state);
        driver.on_back(move |page| {
            if let Ok(mut bank) = back_state.lock() {
                bank.arrive(page);
                bank.render(page);
            }
        });

        Self { driver, state }
    }

    /// Driver showing this bank
    #[must_use]
    pub fn driver(&self) -> MockDriver {
        self.driver.clone()
    }

    /// Current customers
    #[must_use]
    pub fn customers(&self) -> Vec<BankCustomer> {
        self.state
            .lock()
            .map(|s| s.customers.clone())
            .unwrap_or_default()
    }

    /// Customer by first and last name
    #[must_use]
    pub fn customer(&self, first_name: &str, last_name: &str) -> Option<BankCustomer> {
        self.customers()
            .into_iter()
            .find(|c| c.first_name == first_name && c.last_name == last_name)
    }
}
