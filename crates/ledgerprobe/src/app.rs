//! Application profile: locators and signal vocabulary of the system under test.
//!
//! Locators, success keywords and the account-number delimiter are a
//! contract with the remote application, so they live here as data rather
//! than inside workflow logic. [`AppProfile::default`] describes the XYZ
//! Bank demo; any field can be overridden from YAML.

use crate::dialog::OutcomeClassifier;
use crate::locator::Locator;
use serde::{Deserialize, Serialize};

fn button(text: &str) -> Locator {
    Locator::xpath(format!("//button[contains(text(),'{text}')]"))
}

fn placeholder(text: &str) -> Locator {
    Locator::xpath(format!("//input[@placeholder='{text}']"))
}

/// Landing page controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeLocators {
    /// Enter the customer area
    pub customer_login: Locator,
    /// Enter the manager area
    pub manager_login: Locator,
    /// Back to landing page
    pub home_button: Locator,
    /// Page title
    pub title: Locator,
}

impl Default for HomeLocators {
    fn default() -> Self {
        Self {
            customer_login: button("Customer Login"),
            manager_login: button("Bank Manager Login"),
            home_button: button("Home"),
            title: Locator::xpath("//strong[text()='XYZ Bank']"),
        }
    }
}

/// Manager area controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerLocators {
    /// Add-customer tab
    pub add_customer_tab: Locator,
    /// Open-account tab
    pub open_account_tab: Locator,
    /// Customers list tab
    pub customers_tab: Locator,
    /// First name input
    pub first_name: Locator,
    /// Last name input
    pub last_name: Locator,
    /// Post code input
    pub post_code: Locator,
    /// Add-customer submit
    pub add_customer_submit: Locator,
    /// Inline validation marker on the add-customer form
    pub validation_indicator: Locator,
    /// Customer dropdown on the open-account form
    pub customer_select: Locator,
    /// Currency dropdown
    pub currency_select: Locator,
    /// Open-account submit
    pub process_submit: Locator,
    /// Customers table
    pub customers_table: Locator,
    /// One element per customer row
    pub customer_rows: Locator,
    /// Customer search box
    pub search: Locator,
}

impl Default for ManagerLocators {
    fn default() -> Self {
        Self {
            add_customer_tab: button("Add Customer"),
            open_account_tab: button("Open Account"),
            customers_tab: button("Customers"),
            first_name: placeholder("First Name"),
            last_name: placeholder("Last Name"),
            post_code: placeholder("Post Code"),
            add_customer_submit: Locator::xpath(
                "//button[@type='submit' and contains(text(),'Add Customer')]",
            ),
            validation_indicator: Locator::xpath("//span[@style='color:red']"),
            customer_select: Locator::id("userSelect"),
            currency_select: Locator::id("currency"),
            process_submit: Locator::xpath("//button[@type='submit' and contains(text(),'Process')]"),
            customers_table: Locator::xpath("//table"),
            customer_rows: Locator::xpath("//table//tr[td]"),
            search: placeholder("Search Customer"),
        }
    }
}

/// Customer area controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerLocators {
    /// "Your Name" dropdown
    pub user_select: Locator,
    /// Login button
    pub login_button: Locator,
    /// Welcome banner; the protected-state marker
    pub welcome: Locator,
    /// Logout button
    pub logout: Locator,
    /// Transactions tab
    pub transactions_tab: Locator,
    /// Deposit tab
    pub deposit_tab: Locator,
    /// Withdrawal tab (the app labels it "Withdrawl")
    pub withdrawal_tab: Locator,
    /// Amount input
    pub amount: Locator,
    /// Deposit submit
    pub deposit_submit: Locator,
    /// Withdraw submit
    pub withdraw_submit: Locator,
    /// Inline transaction message
    pub message: Locator,
    /// Account summary line containing the balance
    pub balance_panel: Locator,
    /// Transactions reset button
    pub reset_button: Locator,
    /// Start date filter
    pub start_date: Locator,
    /// End date filter
    pub end_date: Locator,
    /// Transactions table
    pub transactions_table: Locator,
    /// One element per transaction row
    pub transaction_rows: Locator,
    /// Leave the transactions view
    pub back_button: Locator,
}

impl Default for CustomerLocators {
    fn default() -> Self {
        Self {
            user_select: Locator::id("userSelect"),
            login_button: button("Login"),
            welcome: Locator::xpath("//span[@class='fontBig ng-binding']"),
            logout: button("Logout"),
            transactions_tab: button("Transactions"),
            deposit_tab: button("Deposit"),
            withdrawal_tab: button("Withdrawl"),
            amount: placeholder("amount"),
            deposit_submit: Locator::xpath("//button[@type='submit' and contains(text(),'Deposit')]"),
            withdraw_submit: Locator::xpath("//button[@type='submit' and contains(text(),'Withdraw')]"),
            message: Locator::xpath("//span[contains(@class,'error')]"),
            balance_panel: Locator::xpath("//strong[contains(text(),'Balance')]/.."),
            reset_button: button("Reset"),
            start_date: Locator::id("start"),
            end_date: Locator::id("end"),
            transactions_table: Locator::xpath("//table"),
            transaction_rows: Locator::xpath("//table//tbody//tr"),
            back_button: button("Back"),
        }
    }
}

/// Text the application uses to report outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signals {
    /// Dialog after adding a customer
    pub customer_created: OutcomeClassifier,
    /// Dialog after opening an account
    pub account_opened: OutcomeClassifier,
    /// Inline message after a deposit or withdrawal
    pub transaction: OutcomeClassifier,
    /// Literal preceding the account number in the account dialog
    pub account_number_delimiter: String,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            customer_created: OutcomeClassifier::any(["successfully", "added"]),
            account_opened: OutcomeClassifier::all(["successfully", "account"]),
            transaction: OutcomeClassifier::any(["successful"]),
            account_number_delimiter: "account Number :".to_string(),
        }
    }
}

/// Everything application-specific the workflows need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppProfile {
    /// Display name
    pub name: String,
    /// Landing URL
    pub base_url: String,
    /// Landing page
    pub home: HomeLocators,
    /// Manager area
    pub manager: ManagerLocators,
    /// Customer area
    pub customer: CustomerLocators,
    /// Outcome vocabulary
    pub signals: Signals,
}

impl AppProfile {
    /// The XYZ Bank demo
    #[must_use]
    pub fn xyz_bank() -> Self {
        Self {
            name: "XYZ Bank".to_string(),
            base_url: "https://www.globalsqa.com/angularJs-protractor/BankingProject/#/login"
                .to_string(),
            home: HomeLocators::default(),
            manager: ManagerLocators::default(),
            customer: CustomerLocators::default(),
            signals: Signals::default(),
        }
    }
}

impl Default for AppProfile {
    fn default() -> Self {
        Self::xyz_bank()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dialog::SignalClass;

    #[test]
    fn test_default_is_xyz_bank() {
        let app = AppProfile::default();
        assert_eq!(app.name, "XYZ Bank");
        assert_eq!(
            app.manager.first_name.to_string(),
            "xpath=//input[@placeholder='First Name']"
        );
        assert_eq!(app.customer.withdrawal_tab.to_string(), "xpath=//button[contains(text(),'Withdrawl')]");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r"
base_url: http://localhost:8080/#/login
signals:
  account_number_delimiter: 'Account No:'
manager:
  search:
    css: input.search
";
        let app: AppProfile = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(app.base_url, "http://localhost:8080/#/login");
        assert_eq!(app.signals.account_number_delimiter, "Account No:");
        assert_eq!(app.manager.search, Locator::css("input.search"));
        assert_eq!(app.manager.customer_select, Locator::id("userSelect"));
        assert_eq!(
            app.signals
                .customer_created
                .classify("Customer added successfully"),
            SignalClass::Success
        );
    }

    #[test]
    fn test_yaml_round_trip_of_defaults() {
        let yaml = serde_yaml_ng::to_string(&AppProfile::default()).unwrap();
        let back: AppProfile = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, AppProfile::default());
    }
}
